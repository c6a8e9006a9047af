use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request rejected as unauthorized (401)")]
    Unauthorized,

    #[error("Rate limited (429)")]
    RateLimited,

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Auth rejections, rate limits and timeouts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Unauthorized | ClientError::RateLimited => true,
            ClientError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Unauthorized.is_retryable());
        assert!(ClientError::RateLimited.is_retryable());
        assert!(!ClientError::Http {
            status: 500,
            message: "boom".to_string()
        }
        .is_retryable());
    }
}

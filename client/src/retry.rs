use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing;

/// How the wait between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `initial`, `2 * initial`, `4 * initial`, ...
    Exponential { initial: Duration },
    /// `step`, `2 * step`, `3 * step`, ...
    Linear { step: Duration },
}

impl Backoff {
    /// Delay after the given failed attempt (1-based). Saturates at
    /// `Duration::MAX`.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { initial } => initial
                .checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
                .unwrap_or(Duration::MAX),
            Backoff::Linear { step } => step.checked_mul(attempt).unwrap_or(Duration::MAX),
        }
    }
}

/// Runs `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or `max_retries` retries have been spent.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    max_retries: u32,
    backoff: Backoff,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt <= max_retries && should_retry(&e) => {
                let delay = backoff.delay(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delays() {
        let linear = Backoff::Linear {
            step: Duration::from_secs(15),
        };
        assert_eq!(linear.delay(1), Duration::from_secs(15));
        assert_eq!(linear.delay(2), Duration::from_secs(30));

        let exponential = Backoff::Exponential {
            initial: Duration::from_millis(100),
        };
        assert_eq!(exponential.delay(1), Duration::from_millis(100));
        assert_eq!(exponential.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_delay_saturates() {
        let exponential = Backoff::Exponential {
            initial: Duration::from_secs(1),
        };
        assert_eq!(exponential.delay(0), Duration::from_secs(1));
        assert_eq!(exponential.delay(200), Duration::MAX);

        let linear = Backoff::Linear {
            step: Duration::MAX,
        };
        assert_eq!(linear.delay(0), Duration::ZERO);
        assert_eq!(linear.delay(3), Duration::MAX);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, String> = retry_with_backoff(
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("failure {n}"))
                } else {
                    Ok(n)
                }
            },
            2,
            Backoff::Linear {
                step: Duration::from_millis(1),
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), String> = retry_with_backoff(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always".to_string())
            },
            2,
            Backoff::Exponential {
                initial: Duration::from_millis(1),
            },
            |_| true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), String> = retry_with_backoff(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("fatal".to_string())
            },
            5,
            Backoff::Linear {
                step: Duration::from_millis(1),
            },
            |e: &String| e != "fatal",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Key-value persistence of whole JSON documents.
///
/// Keys are relative, `/`-separated names such as `deckHistory` or
/// `logs/round360`.
#[async_trait]
pub trait JsonStore: std::fmt::Debug + Send + Sync {
    async fn load_json(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn save_json(&self, key: &str, document: &Value) -> Result<(), StorageError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|part| {
            !part.is_empty()
                && part != "."
                && part != ".."
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

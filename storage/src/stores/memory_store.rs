use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{validate_key, JsonStore};
use crate::error::StorageError;

/// Process-local store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose saves always fail, for exercising the degraded paths.
    pub fn failing() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = documents.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl JsonStore for MemoryStore {
    async fn load_json(&self, key: &str) -> Result<Option<Value>, StorageError> {
        validate_key(key)?;
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        Ok(documents.get(key).cloned())
    }

    async fn save_json(&self, key: &str, document: &Value) -> Result<(), StorageError> {
        validate_key(key)?;
        if self.fail_writes {
            return Err(StorageError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only store"),
            ));
        }
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.insert(key.to_string(), document.clone());
        Ok(())
    }
}

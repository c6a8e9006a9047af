//! Typed, failure-tolerant access to a [`JsonStore`].
//!
//! Nothing here is fatal: an unreadable or malformed document loads as
//! absent and a failed save is logged and reported as `false`.

use serde::{de::DeserializeOwned, Serialize};

use crate::stores::JsonStore;

pub async fn load_document<T: DeserializeOwned>(store: &dyn JsonStore, key: &str) -> Option<T> {
    let value = match store.load_json(key).await {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!(key, "Document not found, starting empty");
            return None;
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to load document, starting empty");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!(key, error = %e, "Malformed document, starting empty");
            None
        }
    }
}

pub async fn save_document<T: Serialize>(store: &dyn JsonStore, key: &str, document: &T) -> bool {
    let value = match serde_json::to_value(document) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to serialize document");
            return false;
        }
    };

    match store.save_json(key, &value).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to save document");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
    }

    #[tokio::test]
    async fn test_round_trips_typed_document() {
        let store = MemoryStore::new();
        assert!(save_document(&store, "counter", &Counter { value: 7 }).await);
        let loaded: Option<Counter> = load_document(&store, "counter").await;
        assert_eq!(loaded, Some(Counter { value: 7 }));
    }

    #[tokio::test]
    async fn test_malformed_document_loads_as_absent() {
        let store = MemoryStore::new();
        store
            .save_json("counter", &serde_json::json!({"value": "seven"}))
            .await
            .unwrap();
        let loaded: Option<Counter> = load_document(&store, "counter").await;
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_failed_save_reports_false() {
        let store = MemoryStore::failing();
        assert!(!save_document(&store, "counter", &Counter { value: 1 }).await);
    }
}

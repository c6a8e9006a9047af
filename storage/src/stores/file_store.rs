use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{validate_key, JsonStore};
use crate::error::StorageError;

/// Stores each document as a pretty-printed `<key>.json` file under a data
/// directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Creates the data directory (and its `logs/` subdirectory) if needed.
    /// Failing to do so is the one fatal storage condition.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let logs_dir = data_dir.join("logs");
        tokio::fs::create_dir_all(&logs_dir)
            .await
            .map_err(|e| StorageError::io(&logs_dir.display().to_string(), e))?;
        tracing::info!(data_dir = %data_dir.display(), "Opened file store");
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl JsonStore for FileStore {
    async fn load_json(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(key, e)),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn save_json(&self, key: &str, document: &Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(key, e))?;
        }
        let contents = serde_json::to_vec_pretty(document)?;

        // Write-then-rename so readers never observe a half-written document.
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        tracing::debug!(key, path = %path.display(), "Saved document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_store_creates_logs_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().join("data");
        let store = FileStore::open(&data_dir).await.unwrap();
        assert!(data_dir.join("logs").is_dir());
        assert_eq!(store.data_dir(), data_dir.as_path());
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        assert!(store.load_json("deckHistory").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nested_key_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        let document = json!([{"oldRoundId": 359, "newRoundId": 360}]);

        store.save_json("logs/roundUpdates", &document).await.unwrap();

        assert!(temp_dir.path().join("logs/roundUpdates.json").is_file());
        assert!(!temp_dir.path().join("logs/roundUpdates.json.tmp").exists());
        assert_eq!(
            store.load_json("logs/roundUpdates").await.unwrap(),
            Some(document)
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        std::fs::write(temp_dir.path().join("currentRound.json"), "{not json").unwrap();
        assert!(matches!(
            store.load_json("currentRound").await,
            Err(StorageError::Serialization(_))
        ));
    }
}

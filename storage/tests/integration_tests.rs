//! Integration tests for the JsonStore implementations and the typed gateway.

use chrono::{TimeZone, Utc};
use storage::{
    keys, load_document, save_document, FileStore, JsonStore, RoundStateDocument,
    RoundUpdateRecord, StorageBackend, StorageConfig, TIMEZONE_UTC,
};

fn round_state(round_id: u32) -> RoundStateDocument {
    RoundStateDocument {
        current_round_id: round_id,
        last_updated: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        timezone: TIMEZONE_UTC.to_string(),
        last_update_date: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap().date_naive()),
    }
}

/// Every backend must hand back exactly what was saved.
async fn assert_round_trip(store: &dyn JsonStore) {
    assert!(save_document(store, keys::CURRENT_ROUND, &round_state(360)).await);
    let loaded: Option<RoundStateDocument> = load_document(store, keys::CURRENT_ROUND).await;
    assert_eq!(loaded, Some(round_state(360)));

    let updates = vec![RoundUpdateRecord {
        old_round_id: 359,
        new_round_id: 360,
        updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 3).unwrap(),
        timezone: TIMEZONE_UTC.to_string(),
    }];
    assert!(save_document(store, keys::ROUND_UPDATES, &updates).await);
    let loaded: Option<Vec<RoundUpdateRecord>> = load_document(store, keys::ROUND_UPDATES).await;
    assert_eq!(loaded, Some(updates));
}

#[tokio::test]
async fn test_file_backend_round_trip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = StorageConfig::from_cli_or_env_or_yaml(
        Some(temp_dir.path().to_path_buf()),
        None,
        Some(storage::config::StorageYaml {
            backend: Some(StorageBackend::File),
            ..Default::default()
        }),
    );
    let store = config.open().await.expect("Failed to open file store");
    assert_round_trip(store.as_ref()).await;
    assert!(temp_dir.path().join("currentRound.json").is_file());
}

#[tokio::test]
async fn test_sqlite_backend_round_trip() {
    let config = StorageConfig::from_cli_or_env_or_yaml(
        None,
        Some("sqlite::memory:".to_string()),
        None,
    );
    let store = config.open().await.expect("Failed to open sqlite store");
    assert_round_trip(store.as_ref()).await;
}

#[tokio::test]
async fn test_file_store_persists_across_reopen() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    {
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        assert!(save_document(&store, keys::CURRENT_ROUND, &round_state(361)).await);
    }
    let reopened = FileStore::open(temp_dir.path()).await.unwrap();
    let loaded: Option<RoundStateDocument> = load_document(&reopened, keys::CURRENT_ROUND).await;
    assert_eq!(loaded.map(|d| d.current_round_id), Some(361));
}

#[tokio::test]
async fn test_round_log_key_is_nested_under_logs() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(temp_dir.path()).await.unwrap();
    assert!(save_document(&store, &keys::round_log(360), &Vec::<u32>::new()).await);
    assert!(temp_dir.path().join("logs/round360.json").is_file());
}

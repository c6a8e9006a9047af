use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};

use super::traits::{validate_key, JsonStore};
use crate::error::StorageError;

const POOL_SIZE: u32 = 5;

/// Keeps every document as a row of a single `documents` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .create_if_missing(true);
        // Every connection to an in-memory database sees its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { POOL_SIZE };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.create_schema().await?;
        tracing::info!(url, "Opened sqlite store");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl JsonStore for SqliteStore {
    async fn load_json(&self, key: &str) -> Result<Option<Value>, StorageError> {
        validate_key(key)?;
        let row = sqlx::query("SELECT body FROM documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        match row {
            Some(r) => {
                let body: String = r
                    .try_get("body")
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn save_json(&self, key: &str, document: &Value) -> Result<(), StorageError> {
        validate_key(key)?;
        let body = serde_json::to_string(document)?;
        sqlx::query(
            "INSERT INTO documents (key, body, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(body)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }
}

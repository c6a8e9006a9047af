use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    error::StorageError,
    stores::{FileStore, JsonStore, SqliteStore},
};

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
}

/// Storage section of the YAML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageYaml {
    pub backend: Option<StorageBackend>,
    pub data_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
}

impl StorageConfig {
    /// CLI argument wins over the environment, which wins over the YAML file.
    pub fn from_cli_or_env_or_yaml(
        cli_data_dir: Option<PathBuf>,
        cli_database_url: Option<String>,
        yaml: Option<StorageYaml>,
    ) -> Self {
        let yaml = yaml.unwrap_or_default();

        let data_dir = if let Some(arg) = cli_data_dir {
            arg
        } else if let Ok(env) = std::env::var("BULLRUN_DATA_DIR") {
            PathBuf::from(env)
        } else if let Some(dir) = yaml.data_dir {
            dir
        } else {
            PathBuf::from(DEFAULT_DATA_DIR)
        };

        let database_url = if let Some(arg) = cli_database_url {
            Some(arg)
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            Some(env)
        } else {
            yaml.database_url
        };

        // A database url without an explicit backend means sqlite.
        let backend = yaml.backend.unwrap_or(if database_url.is_some() {
            StorageBackend::Sqlite
        } else {
            StorageBackend::File
        });

        Self {
            backend,
            data_dir,
            database_url,
        }
    }

    pub async fn open(&self) -> Result<Box<dyn JsonStore>, StorageError> {
        match self.backend {
            StorageBackend::File => Ok(Box::new(FileStore::open(&self.data_dir).await?)),
            StorageBackend::Sqlite => {
                let url = self
                    .database_url
                    .clone()
                    .unwrap_or_else(|| self.data_dir.join("bullrun.db").display().to_string());
                Ok(Box::new(SqliteStore::connect(&url).await?))
            }
        }
    }
}

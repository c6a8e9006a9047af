use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use client::{ClientConfig, DEFAULT_BASE_URL};
use serde::Deserialize;
use storage::{config::StorageYaml, StorageConfig};
use types::RoundId;

use crate::{error::TrackerError, round_manager::DEFAULT_ROUND_ID};

/// Layout of the optional YAML configuration file. Every field may be left
/// out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackerYaml {
    pub storage: Option<StorageYaml>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub round_check_interval_secs: Option<u64>,
    pub default_round_id: Option<RoundId>,
    pub hot_players_max_age_hours: Option<i64>,
    pub leaderboard_rounds: Option<usize>,
    pub leaderboard_request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub storage: StorageConfig,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub round_check_interval: Duration,
    pub default_round_id: RoundId,
    pub hot_players_max_age: chrono::Duration,
    pub leaderboard_rounds: usize,
    pub leaderboard_request_delay: Duration,
}

impl TrackerConfig {
    /// Reads `config_path` when given, then applies CLI and environment
    /// overrides for the storage location.
    pub fn load(
        config_path: Option<&Path>,
        cli_data_dir: Option<PathBuf>,
        cli_database_url: Option<String>,
    ) -> Result<Self, TrackerError> {
        let yaml = match config_path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| TrackerError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Some(serde_yaml::from_str::<TrackerYaml>(&contents)?)
            }
            None => None,
        };
        Self::from_cli_or_env_or_yaml(cli_data_dir, cli_database_url, yaml)
    }

    pub fn from_cli_or_env_or_yaml(
        cli_data_dir: Option<PathBuf>,
        cli_database_url: Option<String>,
        yaml: Option<TrackerYaml>,
    ) -> Result<Self, TrackerError> {
        let yaml = yaml.unwrap_or_default();
        let config = Self {
            storage: StorageConfig::from_cli_or_env_or_yaml(cli_data_dir, cli_database_url, yaml.storage),
            api_base_url: yaml
                .api_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(yaml.request_timeout_secs.unwrap_or(10)),
            poll_interval: Duration::from_secs(yaml.poll_interval_secs.unwrap_or(5)),
            round_check_interval: Duration::from_secs(yaml.round_check_interval_secs.unwrap_or(60)),
            default_round_id: yaml.default_round_id.unwrap_or(DEFAULT_ROUND_ID),
            hot_players_max_age: chrono::Duration::hours(yaml.hot_players_max_age_hours.unwrap_or(24)),
            leaderboard_rounds: yaml.leaderboard_rounds.unwrap_or(10),
            leaderboard_request_delay: Duration::from_millis(yaml.leaderboard_request_delay_ms.unwrap_or(2000)),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TrackerError> {
        if self.poll_interval.is_zero() || self.round_check_interval.is_zero() {
            return Err(TrackerError::Config("intervals must be at least one second".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(TrackerError::Config("request timeout must be positive".to_string()));
        }
        if self.default_round_id == 0 {
            return Err(TrackerError::Config("default round id must be positive".to_string()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: self.request_timeout,
            ..ClientConfig::default()
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::json;
use types::{PlayRecord, RoundId};

use crate::{
    error::ClientError,
    retry::{retry_with_backoff, Backoff},
    sources::{LeaderboardResult, LeaderboardSource, PlaySource},
    wire::BatchItem,
};

pub const DEFAULT_BASE_URL: &str = "https://api.app.infinex.xyz";

const LATEST_PLAYS_PATH: &str = "cardrunGetLatestRoundPlays";
const LEADERBOARD_PATH: &str = "cardrunGetRoundLeaderboard,cardrunGetRoundRealtimeLeaderboard";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ORIGIN: &str = "https://app.infinex.xyz";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Retries after the first leaderboard attempt.
    pub leaderboard_retries: u32,
    /// Linear step between leaderboard retries (15s, 30s, ...).
    pub retry_step: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            leaderboard_retries: 2,
            retry_step: Duration::from_secs(15),
        }
    }
}

/// HTTP client for the card game's batched API.
#[derive(Debug, Clone)]
pub struct CardrunClient {
    http: Client,
    config: ClientConfig,
}

impl CardrunClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::REFERER, header::HeaderValue::from_static("https://app.infinex.xyz/"));
        headers.insert(header::ORIGIN, header::HeaderValue::from_static(ORIGIN));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_batch(
        &self,
        path: &str,
        input: serde_json::Value,
    ) -> Result<Vec<BatchItem>, ClientError> {
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("batch", "1".to_string()), ("input", input.to_string())])
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(ClientError::RateLimited),
            _ => {}
        }
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Latest plays of `round_id`. A single attempt: the poll loop comes
    /// back a few seconds later anyway.
    pub async fn fetch_live_plays(&self, round_id: RoundId) -> Result<Vec<PlayRecord>, ClientError> {
        let items = self
            .get_batch(LATEST_PLAYS_PATH, json!({ "0": { "roundId": round_id } }))
            .await?;
        let plays = items
            .into_iter()
            .next()
            .and_then(BatchItem::into_latest_plays)
            .unwrap_or_default();
        Ok(plays
            .into_iter()
            .filter_map(|play| play.into_play(round_id))
            .collect())
    }

    pub async fn fetch_leaderboard_once(&self, round_id: RoundId) -> Result<LeaderboardResult, ClientError> {
        let items = self
            .get_batch(
                LEADERBOARD_PATH,
                json!({ "0": { "roundId": round_id }, "1": { "roundId": round_id } }),
            )
            .await?;
        Ok(LeaderboardResult::from_batch(items, round_id))
    }
}

#[async_trait]
impl PlaySource for CardrunClient {
    async fn fetch_plays_for_round(&self, round_id: RoundId) -> Vec<PlayRecord> {
        match self.fetch_live_plays(round_id).await {
            Ok(plays) => {
                if plays.is_empty() {
                    tracing::debug!(round_id, "Empty latest plays response");
                } else {
                    tracing::debug!(round_id, count = plays.len(), "Fetched latest plays");
                }
                plays
            }
            Err(e) => {
                tracing::error!(round_id, error = %e, "Failed to fetch latest plays");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LeaderboardSource for CardrunClient {
    async fn fetch_leaderboard(&self, round_id: RoundId) -> LeaderboardResult {
        let result = retry_with_backoff(
            || self.fetch_leaderboard_once(round_id),
            self.config.leaderboard_retries,
            Backoff::Linear {
                step: self.config.retry_step,
            },
            ClientError::is_retryable,
        )
        .await;

        match result {
            Ok(result) => {
                match &result {
                    LeaderboardResult::Leaderboard(entries) => {
                        tracing::info!(round_id, count = entries.len(), "Fetched leaderboard")
                    }
                    LeaderboardResult::Realtime(entries) => {
                        tracing::info!(round_id, count = entries.len(), "Fetched realtime leaderboard")
                    }
                    LeaderboardResult::Empty => tracing::warn!(round_id, "Empty leaderboard response"),
                }
                result
            }
            Err(e) => {
                tracing::error!(round_id, error = %e, "Giving up on leaderboard");
                LeaderboardResult::Empty
            }
        }
    }
}

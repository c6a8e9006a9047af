//! Shapes of the game API's batched responses.
//!
//! Every endpoint answers with a JSON array, one item per batched call. An
//! item carries its payload either under `result.data` or, for some
//! leaderboard calls, directly at the top level. Unknown or error items
//! decode to an item with every slot empty.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use types::{is_excluded, CardId, LeaderboardEntry, PlayRecord, RoundId};

#[derive(Debug, Default, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub result: Option<ResultEnvelope>,
    #[serde(default)]
    pub leaderboard: Option<Vec<WireLeaderboardEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub data: Option<BatchData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchData {
    #[serde(default)]
    pub latest_plays: Option<Vec<WirePlay>>,
    #[serde(default)]
    pub leaderboard: Option<Vec<WireLeaderboardEntry>>,
}

impl BatchItem {
    pub fn into_leaderboard(self) -> Option<Vec<WireLeaderboardEntry>> {
        self.leaderboard
            .or_else(|| self.result.and_then(|r| r.data).and_then(|d| d.leaderboard))
    }

    pub fn into_latest_plays(self) -> Option<Vec<WirePlay>> {
        self.result
            .and_then(|r| r.data)
            .and_then(|d| d.latest_plays)
    }

    pub fn has_leaderboard(&self) -> bool {
        self.leaderboard.is_some()
            || self
                .result
                .as_ref()
                .and_then(|r| r.data.as_ref())
                .is_some_and(|d| d.leaderboard.is_some())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCard {
    #[serde(default)]
    pub card_id: Option<CardId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePlay {
    pub username: String,
    #[serde(default)]
    pub round_id: Option<RoundId>,
    pub created_at: String,
    #[serde(default)]
    pub play: Option<Vec<WireCard>>,
    #[serde(default)]
    pub modifiers: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub round_id: Option<RoundId>,
    #[serde(default)]
    pub play: Option<Vec<WireCard>>,
}

fn card_ids(play: Option<Vec<WireCard>>) -> Vec<CardId> {
    play.unwrap_or_default()
        .into_iter()
        .filter_map(|card| card.card_id)
        .collect()
}

fn modifier_id(value: Value) -> CardId {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) => CardId::Number(id),
            None => CardId::Text(n.to_string()),
        },
        Value::String(s) => CardId::Text(s),
        other => CardId::Text(other.to_string()),
    }
}

impl WirePlay {
    /// Converts to the domain record. Plays from the excluded account or with
    /// an unparseable timestamp are dropped here.
    pub fn into_play(self, requested_round: RoundId) -> Option<PlayRecord> {
        if is_excluded(&self.username) {
            return None;
        }
        let created_at = match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    username = %self.username,
                    created_at = %self.created_at,
                    error = %e,
                    "Dropping play with unparseable timestamp"
                );
                return None;
            }
        };
        Some(PlayRecord {
            username: self.username,
            round_id: self.round_id.unwrap_or(requested_round),
            created_at,
            cards: card_ids(self.play),
            modifiers: self
                .modifiers
                .unwrap_or_default()
                .into_iter()
                .map(modifier_id)
                .collect(),
        })
    }
}

impl WireLeaderboardEntry {
    pub fn into_entry(self, default_round: RoundId) -> Option<LeaderboardEntry> {
        if is_excluded(&self.username) {
            return None;
        }
        let user_id = self.user_id.map(|id| match id {
            Value::String(s) => s,
            other => other.to_string(),
        });
        Some(LeaderboardEntry {
            username: self.username,
            user_id,
            points: self.points.unwrap_or(0.0),
            position: self.position,
            round_id: Some(self.round_id.unwrap_or(default_round)),
            cards: card_ids(self.play),
        })
    }
}

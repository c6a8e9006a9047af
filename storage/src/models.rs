use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use types::{DeckRecord, PlayerDescriptor, RoundId};

pub const TIMEZONE_UTC: &str = "UTC";

fn utc_timezone() -> String {
    TIMEZONE_UTC.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStateDocument {
    pub current_round_id: RoundId,
    pub last_updated: DateTime<Utc>,
    #[serde(default = "utc_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub last_update_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundUpdateRecord {
    pub old_round_id: RoundId,
    pub new_round_id: RoundId,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "utc_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDecksDocument {
    #[serde(default)]
    pub processed_decks: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_players: usize,
    #[serde(default)]
    pub total_decks: usize,
}

impl ProcessedDecksDocument {
    pub fn new(processed_decks: BTreeMap<String, BTreeSet<String>>, now: DateTime<Utc>) -> Self {
        let total_decks = processed_decks.values().map(BTreeSet::len).sum();
        Self {
            total_players: processed_decks.len(),
            total_decks,
            processed_decks,
            last_updated: Some(now),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckHistoryDocument {
    #[serde(default)]
    pub deck_history: BTreeMap<String, Vec<DeckRecord>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_players: usize,
    #[serde(default)]
    pub total_decks: usize,
}

impl DeckHistoryDocument {
    pub fn new(deck_history: BTreeMap<String, Vec<DeckRecord>>, now: DateTime<Utc>) -> Self {
        let total_decks = deck_history.values().map(Vec::len).sum();
        Self {
            total_players: deck_history.len(),
            total_decks,
            deck_history,
            last_updated: Some(now),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSummary {
    pub total_unique_players: usize,
    pub hot_players_count: usize,
    pub regular_players_count: usize,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotPlayersDocument {
    #[serde(default)]
    pub hot_players: Vec<PlayerDescriptor>,
    #[serde(default)]
    pub regular_players: Vec<PlayerDescriptor>,
    #[serde(default)]
    pub analysis: LeaderboardSummary,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub round_ids: Vec<RoundId>,
}

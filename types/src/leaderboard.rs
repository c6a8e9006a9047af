use serde::{Deserialize, Serialize};

use crate::{card::CardId, play::RoundId};

/// One row of a round leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub round_id: Option<RoundId>,
    #[serde(default)]
    pub cards: Vec<CardId>,
}

impl LeaderboardEntry {
    pub fn new(username: &str, round_id: RoundId) -> Self {
        Self {
            username: username.to_string(),
            user_id: None,
            points: 0.0,
            position: None,
            round_id: Some(round_id),
            cards: Vec::new(),
        }
    }
}

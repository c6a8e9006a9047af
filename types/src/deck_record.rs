use std::fmt::Display;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    card::CardId,
    play::{PlayRecord, RoundId},
    player::PlayerDescriptor,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckStatus {
    Hot,
    Top,
}

impl Display for DeckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckStatus::Hot => write!(f, "Hot"),
            DeckStatus::Top => write!(f, "Top"),
        }
    }
}

/// A classified play together with the player's status and the bookkeeping
/// the history store maintains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    pub username: String,
    pub status: DeckStatus,
    pub is_hot: bool,
    pub appearances: u32,
    #[serde(default)]
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub modifiers: Vec<CardId>,
    pub created_at: DateTime<Utc>,
    pub round_id: RoundId,
    /// When this process observed the play.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_update: bool,
}

impl Display for DeckRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} x{}] round {} at {}: {}",
            self.username,
            self.status,
            self.appearances,
            self.round_id,
            self.created_at.to_rfc3339(),
            self.cards.iter().join(", ")
        )
    }
}

impl DeckRecord {
    pub fn from_play(
        play: &PlayRecord,
        descriptor: &PlayerDescriptor,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: play.username.clone(),
            status: if descriptor.is_hot {
                DeckStatus::Hot
            } else {
                DeckStatus::Top
            },
            is_hot: descriptor.is_hot,
            appearances: descriptor.appearances,
            cards: play.cards.clone(),
            modifiers: play.modifiers.clone(),
            created_at: play.created_at,
            round_id: play.round_id,
            timestamp: observed_at,
            added_at: None,
            updated_at: None,
            is_update: false,
        }
    }
}

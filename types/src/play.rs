use std::fmt::Display;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{card::CardId, deck_id::DeckId};

pub type RoundId = u32;

/// A single deck submitted by one player in one round, as observed in a
/// "latest plays" batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub username: String,
    pub round_id: RoundId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub modifiers: Vec<CardId>,
}

impl Display for PlayRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (round {}, {}): [{}]",
            self.username,
            self.round_id,
            self.created_at.to_rfc3339(),
            self.cards.iter().join(", ")
        )
    }
}

impl PlayRecord {
    pub fn new(username: &str, round_id: RoundId, created_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            round_id,
            created_at,
            cards: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_cards(mut self, cards: Vec<CardId>) -> Self {
        self.cards = cards;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<CardId>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn deck_id(&self) -> DeckId {
        DeckId::new(&self.username, self.round_id, self.created_at)
    }
}

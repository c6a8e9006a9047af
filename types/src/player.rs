use serde::{Deserialize, Serialize};

use crate::{card::CardId, play::RoundId};

/// Account that is never tracked. Compared case-insensitively.
pub const EXCLUDED_USERNAME: &str = "seal";

pub fn is_excluded(username: &str) -> bool {
    username.eq_ignore_ascii_case(EXCLUDED_USERNAME)
}

/// What the hot-player analysis knows about a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDescriptor {
    pub username: String,
    pub is_hot: bool,
    pub appearances: u32,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub best_position: Option<u32>,
    #[serde(default)]
    pub rounds: Vec<RoundId>,
    #[serde(default)]
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub last_seen: Option<RoundId>,
}

impl PlayerDescriptor {
    /// Descriptor used when no hot-player list is available and every player
    /// is tracked.
    pub fn fallback(username: &str) -> Self {
        Self {
            username: username.to_string(),
            is_hot: false,
            appearances: 1,
            total_points: 0.0,
            best_position: None,
            rounds: Vec::new(),
            cards: Vec::new(),
            last_seen: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_ignores_case() {
        assert!(is_excluded("seal"));
        assert!(is_excluded("Seal"));
        assert!(is_excluded("SEAL"));
        assert!(!is_excluded("seal2"));
        assert!(!is_excluded("sea"));
    }

    #[test]
    fn test_descriptor_reads_minimal_cache_entry() {
        let descriptor: PlayerDescriptor =
            serde_json::from_str(r#"{"username":"alice","isHot":true,"appearances":3}"#).unwrap();
        assert!(descriptor.is_hot);
        assert_eq!(descriptor.appearances, 3);
        assert!(descriptor.rounds.is_empty());
        assert_eq!(descriptor.best_position, None);
    }
}

use std::{fmt::Display, str::FromStr, sync::LazyLock};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use thiserror::Error;

use crate::play::RoundId;

// The timestamp never contains an underscore, usernames may.
static DECK_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<username>.+)_(?P<round>\d+)_(?P<created>[^_]+)$")
        .expect("deck id pattern is valid")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseDeckIdError {
    #[error("Malformed deck id: {0}")]
    Malformed(String),

    #[error("Invalid round id in deck id: {0}")]
    Round(String),

    #[error("Invalid timestamp in deck id: {0}")]
    Timestamp(String),
}

/// Identity of one observation: `(username, round, createdAt)`.
///
/// Only used for set membership. The string form is what gets persisted in
/// the processed index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeckId {
    pub username: String,
    pub round_id: RoundId,
    pub created_at: DateTime<Utc>,
}

impl DeckId {
    pub fn new(username: &str, round_id: RoundId, created_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            round_id,
            created_at,
        }
    }
}

impl Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Millisecond form unless that would drop sub-millisecond digits.
        let format = if self.created_at.timestamp_subsec_nanos() % 1_000_000 == 0 {
            SecondsFormat::Millis
        } else {
            SecondsFormat::AutoSi
        };
        write!(
            f,
            "{}_{}_{}",
            self.username,
            self.round_id,
            self.created_at.to_rfc3339_opts(format, true)
        )
    }
}

impl FromStr for DeckId {
    type Err = ParseDeckIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = DECK_ID_PATTERN
            .captures(s)
            .ok_or_else(|| ParseDeckIdError::Malformed(s.to_string()))?;
        let round_id = captures["round"]
            .parse::<RoundId>()
            .map_err(|_| ParseDeckIdError::Round(captures["round"].to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&captures["created"])
            .map_err(|_| ParseDeckIdError::Timestamp(captures["created"].to_string()))?
            .with_timezone(&Utc);
        Ok(Self {
            username: captures["username"].to_string(),
            round_id,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deck_id_format_matches_iso_millis() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = DeckId::new("alice", 360, created_at);
        assert_eq!(id.to_string(), "alice_360_2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_deck_id_keeps_sub_millisecond_precision() {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let first = DeckId::new("alice", 360, base + chrono::Duration::microseconds(100));
        let second = DeckId::new("alice", 360, base + chrono::Duration::microseconds(600));

        assert_eq!(first.to_string(), "alice_360_2024-01-02T10:00:00.000100Z");
        assert_ne!(first.to_string(), second.to_string());
        assert_eq!(first.to_string().parse::<DeckId>().unwrap(), first);
    }

    #[test]
    fn test_deck_id_parses_usernames_with_underscores() {
        let id: DeckId = "big_bull_99_360_2024-01-02T03:04:05.120Z".parse().unwrap();
        assert_eq!(id.username, "big_bull_99");
        assert_eq!(id.round_id, 360);
        assert_eq!(
            id.created_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
                + chrono::Duration::milliseconds(120)
        );
    }

    #[test]
    fn test_deck_id_rejects_garbage() {
        assert!(matches!(
            "no-separators".parse::<DeckId>(),
            Err(ParseDeckIdError::Malformed(_))
        ));
        assert!(matches!(
            "alice_360_yesterday".parse::<DeckId>(),
            Err(ParseDeckIdError::Timestamp(_))
        ));
    }
}

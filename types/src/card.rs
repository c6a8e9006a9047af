use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifier of a card or modifier as reported by the game API, which uses
/// both numeric and string ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardId {
    Number(i64),
    Text(String),
}

impl Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardId::Number(id) => write!(f, "{id}"),
            CardId::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for CardId {
    fn from(id: i64) -> Self {
        CardId::Number(id)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        CardId::Text(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        CardId::Text(id)
    }
}

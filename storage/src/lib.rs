pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod stores;

pub use config::{StorageBackend, StorageConfig};
pub use error::StorageError;
pub use gateway::{load_document, save_document};
pub use models::{
    DeckHistoryDocument, HotPlayersDocument, LeaderboardSummary, ProcessedDecksDocument,
    RoundStateDocument, RoundUpdateRecord, TIMEZONE_UTC,
};
pub use stores::{FileStore, JsonStore, MemoryStore, SqliteStore};

/// Store keys of the documents the tracker persists.
pub mod keys {
    use types::RoundId;

    pub const CURRENT_ROUND: &str = "currentRound";
    pub const PROCESSED_DECKS: &str = "processedDecks";
    pub const DECK_HISTORY: &str = "deckHistory";
    pub const TOP_PLAYERS: &str = "topPlayers";
    pub const ROUND_UPDATES: &str = "logs/roundUpdates";

    pub fn round_log(round_id: RoundId) -> String {
        format!("logs/round{round_id}")
    }
}

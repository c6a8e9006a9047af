pub mod clock;
pub mod config;
pub mod deck_tracker;
pub mod error;
pub mod history;
pub mod hot_players;
pub mod monitor;
pub mod play_log;
pub mod processed;
pub mod report;
pub mod round_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use deck_tracker::{Classification, ClassifiedDecks, DeckTracker, PruneReport, TrackerStats};
pub use error::TrackerError;
pub use history::{HistoryStore, UpsertOutcome, HISTORY_LIMIT};
pub use hot_players::{
    analyze_card_similarity, analyze_leaderboard, generate_round_ids, CardSimilarity,
    HotPlayerCache, LeaderboardAnalysis,
};
pub use monitor::{Monitor, MonitorSettings};
pub use play_log::PlayLog;
pub use processed::ProcessedIndex;
pub use round_manager::{
    evaluate_rollover, NextUpdateInfo, RoundCheck, RoundManager, RoundState, RoundUpdate,
    DEFAULT_ROUND_ID,
};

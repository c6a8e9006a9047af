pub mod card;
pub mod deck_id;
pub mod deck_record;
pub mod leaderboard;
pub mod play;
pub mod player;

pub use card::CardId;
pub use deck_id::{DeckId, ParseDeckIdError};
pub use deck_record::{DeckRecord, DeckStatus};
pub use leaderboard::LeaderboardEntry;
pub use play::{PlayRecord, RoundId};
pub use player::{is_excluded, PlayerDescriptor, EXCLUDED_USERNAME};

pub mod client;
pub mod error;
pub mod import;
pub mod retry;
pub mod sources;
pub mod wire;

pub use client::{CardrunClient, ClientConfig, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use import::parse_leaderboard_responses;
pub use retry::{retry_with_backoff, Backoff};
pub use sources::{LeaderboardResult, LeaderboardSource, PlaySource};

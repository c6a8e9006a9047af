use std::time::Duration;

use async_trait::async_trait;
use types::{LeaderboardEntry, PlayRecord, RoundId};

use crate::wire::BatchItem;

/// A round leaderboard, tagged with the slot of the batched response that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardResult {
    Leaderboard(Vec<LeaderboardEntry>),
    Realtime(Vec<LeaderboardEntry>),
    Empty,
}

impl LeaderboardResult {
    /// The first batch item holds the final leaderboard, the second the
    /// realtime one. The final leaderboard wins when both are present.
    pub fn from_batch(items: Vec<BatchItem>, round_id: RoundId) -> Self {
        let mut slots = items.into_iter().map(BatchItem::into_leaderboard);
        let final_board = slots.next().flatten();
        let realtime_board = slots.next().flatten();

        let convert = |entries: Vec<crate::wire::WireLeaderboardEntry>| -> Vec<LeaderboardEntry> {
            entries
                .into_iter()
                .filter_map(|e| e.into_entry(round_id))
                .collect()
        };

        match (final_board, realtime_board) {
            (Some(entries), _) => LeaderboardResult::Leaderboard(convert(entries)),
            (None, Some(entries)) => LeaderboardResult::Realtime(convert(entries)),
            (None, None) => LeaderboardResult::Empty,
        }
    }

    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        match self {
            LeaderboardResult::Leaderboard(entries) | LeaderboardResult::Realtime(entries) => {
                entries
            }
            LeaderboardResult::Empty => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LeaderboardResult::Leaderboard(entries) | LeaderboardResult::Realtime(entries) => {
                entries.len()
            }
            LeaderboardResult::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where the tracker gets the latest plays of a round from. Failures are
/// absorbed by the implementation and surface as an empty batch.
#[async_trait]
pub trait PlaySource: Send + Sync {
    async fn fetch_plays_for_round(&self, round_id: RoundId) -> Vec<PlayRecord>;
}

#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch_leaderboard(&self, round_id: RoundId) -> LeaderboardResult;

    /// Fetches rounds one after another, pausing `delay` between requests.
    async fn fetch_leaderboards(
        &self,
        round_ids: &[RoundId],
        delay: Duration,
    ) -> Vec<LeaderboardEntry> {
        let mut all_entries = Vec::new();
        for (i, &round_id) in round_ids.iter().enumerate() {
            tracing::info!(round_id, "Fetching leaderboard ({}/{})", i + 1, round_ids.len());
            all_entries.extend(self.fetch_leaderboard(round_id).await.into_entries());
            if i + 1 < round_ids.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        tracing::info!(total = all_entries.len(), "Fetched leaderboard entries");
        all_entries
    }
}

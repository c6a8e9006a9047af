use std::sync::Arc;

use itertools::Itertools;
use storage::{keys, load_document, save_document, JsonStore};
use types::{DeckRecord, RoundId};

/// Append-only per-round record of every emitted deck (`logs/round{N}`).
#[derive(Debug, Clone)]
pub struct PlayLog {
    store: Arc<dyn JsonStore>,
}

impl PlayLog {
    pub fn new(store: Arc<dyn JsonStore>) -> Self {
        Self { store }
    }

    pub async fn read(&self, round_id: RoundId) -> Vec<DeckRecord> {
        load_document(self.store.as_ref(), &keys::round_log(round_id))
            .await
            .unwrap_or_default()
    }

    /// Appends decks to their round's log, one write per round. Returns the
    /// number of decks written.
    pub async fn append_all<'a>(&self, decks: impl IntoIterator<Item = &'a DeckRecord>) -> usize {
        let by_round = decks.into_iter().into_group_map_by(|deck| deck.round_id);

        let mut written = 0;
        for (round_id, decks) in by_round.into_iter().sorted_by_key(|(round_id, _)| *round_id) {
            let key = keys::round_log(round_id);
            let mut log = self.read(round_id).await;
            log.extend(decks.iter().map(|deck| (*deck).clone()));
            if save_document(self.store.as_ref(), &key, &log).await {
                tracing::debug!(key = %key, appended = decks.len(), "Play log saved");
                written += decks.len();
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storage::MemoryStore;
    use types::{PlayRecord, PlayerDescriptor};

    fn deck(username: &str, round_id: RoundId) -> DeckRecord {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        DeckRecord::from_play(
            &PlayRecord::new(username, round_id, created_at),
            &PlayerDescriptor::fallback(username),
            created_at,
        )
    }

    #[tokio::test]
    async fn test_appends_grouped_by_round() {
        let store = Arc::new(MemoryStore::new());
        let log = PlayLog::new(store.clone());

        let first = [deck("alice", 360), deck("bob", 361)];
        assert_eq!(log.append_all(&first).await, 2);
        let second = [deck("carol", 360)];
        assert_eq!(log.append_all(&second).await, 1);

        let round_360 = log.read(360).await;
        assert_eq!(
            round_360.iter().map(|d| d.username.as_str()).collect_vec(),
            vec!["alice", "carol"]
        );
        assert_eq!(log.read(361).await.len(), 1);
        assert!(log.read(362).await.is_empty());
        assert_eq!(store.keys(), vec!["logs/round360", "logs/round361"]);
    }

    #[tokio::test]
    async fn test_failed_write_counts_nothing() {
        let log = PlayLog::new(Arc::new(MemoryStore::failing()));
        assert_eq!(log.append_all(&[deck("alice", 360)]).await, 0);
    }
}

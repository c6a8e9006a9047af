use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use storage::{keys, load_document, save_document, DeckHistoryDocument, JsonStore, ProcessedDecksDocument};
use types::{is_excluded, DeckRecord, PlayRecord, PlayerDescriptor};

use crate::{
    clock::Clock,
    history::{HistoryStore, UpsertOutcome},
    processed::ProcessedIndex,
};

/// How a play relates to what the player already has for its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Update,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedDecks {
    pub new_decks: Vec<DeckRecord>,
    pub updated_decks: Vec<DeckRecord>,
}

impl ClassifiedDecks {
    pub fn len(&self) -> usize {
        self.new_decks.len() + self.updated_decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeckRecord> {
        self.new_decks.iter().chain(self.updated_decks.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub total_players: usize,
    pub total_processed_decks: usize,
    pub players_with_history: usize,
    pub total_history_decks: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub processed_removed: usize,
    pub history_removed: usize,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.processed_removed == 0 && self.history_removed == 0
    }
}

/// Decides, per observed play, whether it is new, a revision or a repeat, and
/// keeps the processed index and deck history that back that decision.
#[derive(Debug)]
pub struct DeckTracker {
    processed: ProcessedIndex,
    history: HistoryStore,
    store: Arc<dyn JsonStore>,
    clock: Arc<dyn Clock>,
}

impl DeckTracker {
    /// Starts empty. Use [`DeckTracker::initialize`] to pick up persisted
    /// state.
    pub fn new(store: Arc<dyn JsonStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            processed: ProcessedIndex::new(),
            history: HistoryStore::new(),
            store,
            clock,
        }
    }

    /// Loads the processed index and history. Missing or unreadable documents
    /// start empty.
    pub async fn initialize(store: Arc<dyn JsonStore>, clock: Arc<dyn Clock>) -> Self {
        let processed = load_document::<ProcessedDecksDocument>(store.as_ref(), keys::PROCESSED_DECKS)
            .await
            .map(ProcessedIndex::from_document)
            .unwrap_or_default();
        let history = load_document::<DeckHistoryDocument>(store.as_ref(), keys::DECK_HISTORY)
            .await
            .map(HistoryStore::from_document)
            .unwrap_or_default();

        tracing::info!(
            processed_players = processed.player_count(),
            history_players = history.player_count(),
            "Deck tracker initialized"
        );
        Self {
            processed,
            history,
            store,
            clock,
        }
    }

    /// Compares a play against the player's history entry for its round.
    /// Equal timestamps count as a duplicate.
    pub fn classify_play(&self, play: &PlayRecord) -> Classification {
        match self.history.entry_for_round(&play.username, play.round_id) {
            None => Classification::New,
            Some(existing) if play.created_at > existing.created_at => Classification::Update,
            Some(_) => Classification::Duplicate,
        }
    }

    /// Classifies one batch of plays and records the new and updated ones.
    ///
    /// With a non-empty `hot_players` list only those players are tracked,
    /// otherwise everyone is, with a non-hot descriptor. Both documents are
    /// saved when anything changed, history first.
    pub async fn classify(&mut self, plays: &[PlayRecord], hot_players: &[PlayerDescriptor]) -> ClassifiedDecks {
        let descriptors: HashMap<&str, &PlayerDescriptor> = hot_players
            .iter()
            .map(|descriptor| (descriptor.username.as_str(), descriptor))
            .collect();
        let now = self.clock.now();
        let mut classified = ClassifiedDecks::default();

        for play in plays {
            if is_excluded(&play.username) {
                tracing::debug!(username = %play.username, "Skipping excluded player");
                continue;
            }

            let fallback;
            let descriptor = if descriptors.is_empty() {
                fallback = PlayerDescriptor::fallback(&play.username);
                &fallback
            } else {
                match descriptors.get(play.username.as_str()) {
                    Some(descriptor) => *descriptor,
                    None => continue,
                }
            };

            let deck_id = play.deck_id();
            if self.processed.contains(&deck_id) {
                continue;
            }

            let classification = self.classify_play(play);
            if classification == Classification::Duplicate {
                tracing::debug!(
                    username = %play.username,
                    round_id = play.round_id,
                    "Skipping duplicate deck"
                );
                continue;
            }

            let record = DeckRecord::from_play(play, descriptor, now);
            let outcome = self.history.upsert(&play.username, record, now);
            self.processed.mark(&deck_id);

            match outcome {
                UpsertOutcome::Replaced(stored) => {
                    tracing::info!(username = %play.username, round_id = play.round_id, "Updated deck");
                    classified.updated_decks.push(stored);
                }
                UpsertOutcome::Inserted(stored) => {
                    tracing::info!(username = %play.username, round_id = play.round_id, "New deck");
                    classified.new_decks.push(stored);
                }
            }
        }

        if !classified.is_empty() {
            self.persist().await;
        }
        classified
    }

    /// Saves history, then the processed index. Failures are logged and the
    /// in-memory state is kept.
    pub async fn persist(&self) -> bool {
        let now = self.clock.now();
        let history_saved = save_document(
            self.store.as_ref(),
            keys::DECK_HISTORY,
            &self.history.to_document(now),
        )
        .await;
        let index_saved = save_document(
            self.store.as_ref(),
            keys::PROCESSED_DECKS,
            &self.processed.to_document(now),
        )
        .await;
        history_saved && index_saved
    }

    pub fn history(&self, username: &str) -> &[DeckRecord] {
        self.history.query(username)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            total_players: self.processed.player_count(),
            total_processed_decks: self.processed.deck_count(),
            players_with_history: self.history.player_count(),
            total_history_decks: self.history.deck_count(),
        }
    }

    /// Drops history records and processed ids created more than
    /// `days_to_keep` days ago. Saves only when something was removed.
    pub async fn clean_old_data(&mut self, days_to_keep: u32) -> PruneReport {
        let cutoff: DateTime<Utc> = self.clock.now() - Duration::days(i64::from(days_to_keep));
        let report = PruneReport {
            processed_removed: self.processed.prune_older_than(cutoff),
            history_removed: self.history.prune_older_than(cutoff),
        };
        if !report.is_empty() {
            self.persist().await;
            tracing::info!(
                processed_removed = report.processed_removed,
                history_removed = report.history_removed,
                "Cleaned old deck data"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use storage::MemoryStore;
    use types::CardId;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
    }

    fn tracker() -> (DeckTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        (DeckTracker::new(store.clone(), clock), store)
    }

    fn hot(username: &str, appearances: u32) -> PlayerDescriptor {
        PlayerDescriptor {
            is_hot: true,
            appearances,
            ..PlayerDescriptor::fallback(username)
        }
    }

    #[tokio::test]
    async fn test_classify_new_then_duplicate() {
        let (mut tracker, _) = tracker();
        let plays = vec![PlayRecord::new("alice", 360, start()).with_cards(vec![CardId::Number(7)])];

        let first = tracker.classify(&plays, &[]).await;
        assert_eq!(first.new_decks.len(), 1);
        assert_eq!(first.new_decks[0].status, types::DeckStatus::Top);
        assert_eq!(first.new_decks[0].appearances, 1);

        let second = tracker.classify(&plays, &[]).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_later_play_is_update_earlier_is_skipped() {
        let (mut tracker, _) = tracker();
        let original = PlayRecord::new("alice", 360, start());
        tracker.classify(&[original], &[]).await;

        let earlier = PlayRecord::new("alice", 360, start() - Duration::minutes(1));
        assert_eq!(tracker.classify_play(&earlier), Classification::Duplicate);
        assert!(tracker.classify(&[earlier], &[]).await.is_empty());

        let later = PlayRecord::new("alice", 360, start() + Duration::minutes(1));
        let result = tracker.classify(&[later], &[]).await;
        assert_eq!(result.updated_decks.len(), 1);
        assert!(result.updated_decks[0].is_update);
        assert_eq!(tracker.history("alice").len(), 1);
    }

    #[tokio::test]
    async fn test_sub_millisecond_later_play_is_update() {
        let (mut tracker, _) = tracker();
        let first = PlayRecord::new("alice", 360, start() + Duration::microseconds(100));
        let second = PlayRecord::new("alice", 360, start() + Duration::microseconds(600));

        assert_eq!(tracker.classify(&[first], &[]).await.new_decks.len(), 1);
        let result = tracker.classify(&[second], &[]).await;
        assert_eq!(result.updated_decks.len(), 1);
        assert_eq!(
            result.updated_decks[0].created_at,
            start() + Duration::microseconds(600)
        );
    }

    #[tokio::test]
    async fn test_new_deck_older_than_full_history_is_still_emitted() {
        let (mut tracker, _) = tracker();
        let recent: Vec<PlayRecord> = (0..50)
            .map(|i| PlayRecord::new("alice", 310 + i, start() + Duration::hours(i64::from(i))))
            .collect();
        assert_eq!(tracker.classify(&recent, &[]).await.new_decks.len(), 50);

        let old = PlayRecord::new("alice", 300, start() - Duration::days(1));
        let result = tracker.classify(&[old], &[]).await;
        assert_eq!(result.new_decks.len(), 1);
        assert_eq!(result.new_decks[0].round_id, 300);
        assert_eq!(tracker.stats().total_processed_decks, 51);
        assert_eq!(tracker.history("alice").len(), 50);
    }

    #[tokio::test]
    async fn test_hot_list_filters_players() {
        let (mut tracker, _) = tracker();
        let plays = vec![
            PlayRecord::new("alice", 360, start()),
            PlayRecord::new("bob", 360, start()),
            PlayRecord::new("SEAL", 360, start()),
        ];
        let hot_players = vec![hot("alice", 3), hot("SEAL", 9)];

        let result = tracker.classify(&plays, &hot_players).await;
        assert_eq!(result.new_decks.len(), 1);
        assert_eq!(result.new_decks[0].username, "alice");
        assert_eq!(result.new_decks[0].status, types::DeckStatus::Hot);
        assert_eq!(result.new_decks[0].appearances, 3);
    }

    #[tokio::test]
    async fn test_persists_history_and_index_on_change() {
        let (mut tracker, store) = tracker();
        assert!(tracker.classify(&[], &[]).await.is_empty());
        assert!(store.keys().is_empty());

        tracker
            .classify(&[PlayRecord::new("alice", 360, start())], &[])
            .await;
        let keys = store.keys();
        assert!(keys.contains(&keys::DECK_HISTORY.to_string()));
        assert!(keys.contains(&keys::PROCESSED_DECKS.to_string()));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory_state() {
        let store = Arc::new(MemoryStore::failing());
        let clock = Arc::new(ManualClock::new(start()));
        let mut tracker = DeckTracker::new(store, clock);

        let plays = vec![PlayRecord::new("alice", 360, start())];
        assert_eq!(tracker.classify(&plays, &[]).await.len(), 1);
        assert!(!tracker.persist().await);
        assert!(tracker.classify(&plays, &[]).await.is_empty());
        assert_eq!(tracker.stats().total_processed_decks, 1);
    }

    #[tokio::test]
    async fn test_clean_old_data_prunes_both_documents() {
        let (mut tracker, _) = tracker();
        tracker
            .classify(
                &[
                    PlayRecord::new("alice", 320, start() - Duration::days(45)),
                    PlayRecord::new("alice", 360, start()),
                ],
                &[],
            )
            .await;

        let report = tracker.clean_old_data(30).await;
        assert_eq!(
            report,
            PruneReport {
                processed_removed: 1,
                history_removed: 1
            }
        );
        assert_eq!(
            tracker.stats(),
            TrackerStats {
                total_players: 1,
                total_processed_decks: 1,
                players_with_history: 1,
                total_history_decks: 1,
            }
        );
        assert!(tracker.clean_old_data(30).await.is_empty());
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use storage::ProcessedDecksDocument;
use types::DeckId;

/// Per-player set of deck ids that have already been handled.
///
/// Ids are kept in their persisted string form so entries written by older
/// versions survive a load/save cycle untouched.
#[derive(Debug, Default, Clone)]
pub struct ProcessedIndex {
    decks: HashMap<String, HashSet<String>>,
}

impl ProcessedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: ProcessedDecksDocument) -> Self {
        let decks = document
            .processed_decks
            .into_iter()
            .map(|(username, ids)| (username, ids.into_iter().collect()))
            .collect();
        Self { decks }
    }

    pub fn to_document(&self, now: DateTime<Utc>) -> ProcessedDecksDocument {
        let decks: BTreeMap<String, BTreeSet<String>> = self
            .decks
            .iter()
            .map(|(username, ids)| (username.clone(), ids.iter().cloned().collect()))
            .collect();
        ProcessedDecksDocument::new(decks, now)
    }

    pub fn contains(&self, deck_id: &DeckId) -> bool {
        self.decks
            .get(&deck_id.username)
            .is_some_and(|ids| ids.contains(&deck_id.to_string()))
    }

    pub fn mark(&mut self, deck_id: &DeckId) {
        self.decks
            .entry(deck_id.username.clone())
            .or_default()
            .insert(deck_id.to_string());
    }

    pub fn player_count(&self) -> usize {
        self.decks.len()
    }

    pub fn deck_count(&self) -> usize {
        self.decks.values().map(HashSet::len).sum()
    }

    /// Drops ids whose creation time is before `cutoff`. Ids that cannot be
    /// parsed are kept.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for ids in self.decks.values_mut() {
            let before = ids.len();
            ids.retain(|id| match id.parse::<DeckId>() {
                Ok(deck_id) => deck_id.created_at >= cutoff,
                Err(_) => true,
            });
            removed += before - ids.len();
        }
        self.decks.retain(|_, ids| !ids.is_empty());
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn deck_id(username: &str, round_id: u32, day: u32) -> DeckId {
        DeckId::new(
            username,
            round_id,
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_mark_and_contains() {
        let mut index = ProcessedIndex::new();
        let id = deck_id("alice", 360, 2);
        assert!(!index.contains(&id));
        index.mark(&id);
        index.mark(&id);
        assert!(index.contains(&id));
        assert!(!index.contains(&deck_id("alice", 361, 2)));
        assert_eq!(index.deck_count(), 1);
    }

    #[test]
    fn test_document_round_trip_keeps_unknown_ids() {
        let mut document = ProcessedDecksDocument::default();
        document.processed_decks.insert(
            "alice".to_string(),
            BTreeSet::from([
                "legacy-id".to_string(),
                deck_id("alice", 360, 2).to_string(),
            ]),
        );
        let index = ProcessedIndex::from_document(document);
        assert!(index.contains(&deck_id("alice", 360, 2)));

        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let saved = index.to_document(now);
        assert!(saved.processed_decks["alice"].contains("legacy-id"));
        assert_eq!(saved.total_decks, 2);
    }

    #[test]
    fn test_prune_removes_old_ids_and_empty_players() {
        let mut index = ProcessedIndex::new();
        index.mark(&deck_id("alice", 358, 1));
        index.mark(&deck_id("alice", 362, 5));
        index.mark(&deck_id("bob", 358, 1));

        let cutoff = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(index.prune_older_than(cutoff), 2);
        assert_eq!(index.player_count(), 1);
        assert!(index.contains(&deck_id("alice", 362, 5)));
    }
}

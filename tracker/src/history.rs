use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use storage::DeckHistoryDocument;
use types::{DeckRecord, RoundId};

/// Records kept per player.
pub const HISTORY_LIMIT: usize = 50;

/// The record as stored by an upsert, taken before the history is capped.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted(DeckRecord),
    Replaced(DeckRecord),
}

/// Bounded per-player deck archive, newest first, one record per round.
#[derive(Debug, Default, Clone)]
pub struct HistoryStore {
    players: HashMap<String, Vec<DeckRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a persisted document, repairing ordering and per-round
    /// uniqueness on the way in.
    pub fn from_document(document: DeckHistoryDocument) -> Self {
        let mut players: HashMap<String, Vec<DeckRecord>> =
            document.deck_history.into_iter().collect();
        players.values_mut().for_each(normalize);
        players.retain(|_, records| !records.is_empty());
        Self { players }
    }

    pub fn to_document(&self, now: DateTime<Utc>) -> DeckHistoryDocument {
        let history: BTreeMap<String, Vec<DeckRecord>> = self
            .players
            .iter()
            .map(|(username, records)| (username.clone(), records.clone()))
            .collect();
        DeckHistoryDocument::new(history, now)
    }

    pub fn query(&self, username: &str) -> &[DeckRecord] {
        self.players
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn entry_for_round(&self, username: &str, round_id: RoundId) -> Option<&DeckRecord> {
        self.query(username)
            .iter()
            .find(|record| record.round_id == round_id)
    }

    /// Stores `record` in the player's slot for its round. The record may be
    /// dropped right away when it is older than everything the cap keeps.
    pub fn upsert(&mut self, username: &str, mut record: DeckRecord, now: DateTime<Utc>) -> UpsertOutcome {
        let records = self.players.entry(username.to_string()).or_default();
        let outcome = match records.iter().position(|r| r.round_id == record.round_id) {
            Some(index) => {
                record.added_at = records[index].added_at;
                record.updated_at = Some(now);
                record.is_update = true;
                records[index] = record.clone();
                UpsertOutcome::Replaced(record)
            }
            None => {
                record.added_at = Some(now);
                record.updated_at = None;
                record.is_update = false;
                records.push(record.clone());
                UpsertOutcome::Inserted(record)
            }
        };
        normalize(records);
        outcome
    }

    /// Removes records created before `cutoff` and players left empty.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for records in self.players.values_mut() {
            let before = records.len();
            records.retain(|record| record.created_at >= cutoff);
            removed += before - records.len();
        }
        self.players.retain(|_, records| !records.is_empty());
        removed
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn deck_count(&self) -> usize {
        self.players.values().map(Vec::len).sum()
    }
}

// Newest first, latest record wins per round, capped.
fn normalize(records: &mut Vec<DeckRecord>) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut seen_rounds = std::collections::HashSet::new();
    records.retain(|record| seen_rounds.insert(record.round_id));
    records.truncate(HISTORY_LIMIT);
}

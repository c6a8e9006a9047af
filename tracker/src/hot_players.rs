//! Who is worth tracking: players that keep showing up on recent
//! leaderboards.

use std::{collections::HashMap, sync::Arc};

use chrono::Duration;
use client::LeaderboardSource;
use itertools::Itertools;
use storage::{keys, load_document, save_document, HotPlayersDocument, JsonStore, LeaderboardSummary};
use types::{is_excluded, CardId, LeaderboardEntry, PlayerDescriptor, RoundId};

use crate::clock::Clock;

/// Appearances needed to count as hot.
pub const HOT_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardAnalysis {
    pub hot_players: Vec<PlayerDescriptor>,
    pub regular_players: Vec<PlayerDescriptor>,
    pub total_unique_players: usize,
    pub total_records: usize,
}

impl LeaderboardAnalysis {
    pub fn summary(&self) -> LeaderboardSummary {
        LeaderboardSummary {
            total_unique_players: self.total_unique_players,
            hot_players_count: self.hot_players.len(),
            regular_players_count: self.regular_players.len(),
            total_records: self.total_records,
        }
    }
}

/// Aggregates leaderboard rows per player. Hot players are ordered by
/// appearances, the rest by best position.
pub fn analyze_leaderboard(entries: &[LeaderboardEntry]) -> LeaderboardAnalysis {
    let mut players: Vec<PlayerDescriptor> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries.iter().filter(|e| !is_excluded(&e.username)) {
        let slot = *index.entry(entry.username.as_str()).or_insert_with(|| {
            players.push(PlayerDescriptor {
                appearances: 0,
                ..PlayerDescriptor::fallback(&entry.username)
            });
            players.len() - 1
        });
        let player = &mut players[slot];
        player.appearances += 1;
        player.total_points += entry.points;
        player.best_position = match (player.best_position, entry.position) {
            (Some(best), Some(position)) => Some(best.min(position)),
            (best, position) => best.or(position),
        };
        if let Some(round_id) = entry.round_id {
            player.rounds.push(round_id);
        }
        for card in &entry.cards {
            if !player.cards.contains(card) {
                player.cards.push(card.clone());
            }
        }
    }

    let total_unique_players = players.len();
    let (hot_players, regular_players): (Vec<_>, Vec<_>) = players
        .into_iter()
        .map(|mut player| {
            player.is_hot = player.appearances >= HOT_THRESHOLD;
            player.last_seen = player.rounds.iter().copied().max();
            player
        })
        .partition(|player| player.is_hot);

    let hot_players = hot_players
        .into_iter()
        .sorted_by(|a, b| b.appearances.cmp(&a.appearances))
        .collect_vec();
    let regular_players = regular_players
        .into_iter()
        .sorted_by_key(|player| player.best_position.unwrap_or(u32::MAX))
        .collect_vec();

    tracing::info!(
        unique_players = total_unique_players,
        hot = hot_players.len(),
        regular = regular_players.len(),
        "Leaderboard analysis complete"
    );
    LeaderboardAnalysis {
        hot_players,
        regular_players,
        total_unique_players,
        total_records: entries.len(),
    }
}

/// `[current, current - 1, ...]`, stopping at round 1.
pub fn generate_round_ids(current_round_id: RoundId, count: usize) -> Vec<RoundId> {
    (1..=current_round_id).rev().take(count).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardSimilarity {
    pub player1: String,
    pub player2: String,
    pub common_cards: Vec<CardId>,
    pub similarity: f64,
    pub common_count: usize,
}

/// Pairs of players sharing at least one card, most similar first.
pub fn analyze_card_similarity(players: &[PlayerDescriptor]) -> Vec<CardSimilarity> {
    let similarities = players
        .iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            let first = a.cards.iter().unique().collect_vec();
            let second = b.cards.iter().unique().collect_vec();
            let common_cards = first
                .iter()
                .filter(|card| second.contains(*card))
                .map(|card| (*card).clone())
                .collect_vec();
            if common_cards.is_empty() {
                return None;
            }
            let ratio = common_cards.len() as f64 / first.len().max(second.len()) as f64;
            Some(CardSimilarity {
                player1: a.username.clone(),
                player2: b.username.clone(),
                common_count: common_cards.len(),
                common_cards,
                similarity: (ratio * 100.0).round() / 100.0,
            })
        })
        .sorted_by(|x, y| y.similarity.total_cmp(&x.similarity))
        .collect_vec();

    tracing::debug!(pairs = similarities.len(), "Card similarity computed");
    similarities
}

/// The persisted hot-player list and the rules for when to refresh it.
#[derive(Debug)]
pub struct HotPlayerCache {
    store: Arc<dyn JsonStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl HotPlayerCache {
    pub fn new(store: Arc<dyn JsonStore>, clock: Arc<dyn Clock>, max_age: Duration) -> Self {
        Self { store, clock, max_age }
    }

    pub async fn load(&self) -> Option<HotPlayersDocument> {
        load_document(self.store.as_ref(), keys::TOP_PLAYERS).await
    }

    pub fn is_fresh(&self, document: &HotPlayersDocument) -> bool {
        self.clock.now() - document.last_updated < self.max_age
    }

    /// Persists an analysis. Round ids are taken from the analyzed entries.
    pub async fn save_analysis(&self, analysis: &LeaderboardAnalysis, entries: &[LeaderboardEntry]) -> HotPlayersDocument {
        let round_ids = entries
            .iter()
            .filter_map(|entry| entry.round_id)
            .unique()
            .sorted_by(|a, b| b.cmp(a))
            .collect_vec();
        let document = HotPlayersDocument {
            hot_players: analysis.hot_players.clone(),
            regular_players: analysis.regular_players.clone(),
            analysis: analysis.summary(),
            last_updated: self.clock.now(),
            round_ids,
        };
        if save_document(self.store.as_ref(), keys::TOP_PLAYERS, &document).await {
            tracing::info!(hot_players = document.hot_players.len(), "Hot players saved");
        }
        document
    }

    /// Hot players to track right now.
    ///
    /// A fresh cache is used as is unless `force` is set. Otherwise the last
    /// `rounds` leaderboards are fetched and analyzed. When nothing could be
    /// fetched the cached list is used even if stale, and with no cache the
    /// result is empty, meaning every player is tracked.
    pub async fn resolve(
        &self,
        source: &dyn LeaderboardSource,
        current_round_id: RoundId,
        rounds: usize,
        delay: std::time::Duration,
        force: bool,
    ) -> Vec<PlayerDescriptor> {
        let cached = self.load().await;
        if let Some(document) = &cached {
            let age_hours = (self.clock.now() - document.last_updated).num_hours();
            if !force && !document.hot_players.is_empty() && self.is_fresh(document) {
                tracing::info!(
                    hot_players = document.hot_players.len(),
                    age_hours,
                    "Using cached hot players"
                );
                return document.hot_players.clone();
            }
            tracing::info!(age_hours, "Hot player cache is stale, refreshing");
        }

        let round_ids = generate_round_ids(current_round_id, rounds);
        let entries = source.fetch_leaderboards(&round_ids, delay).await;
        if !entries.is_empty() {
            let analysis = analyze_leaderboard(&entries);
            return self.save_analysis(&analysis, &entries).await.hot_players;
        }

        match cached {
            Some(document) if !document.hot_players.is_empty() => {
                tracing::warn!(
                    hot_players = document.hot_players.len(),
                    "No leaderboard data, falling back to cached hot players"
                );
                document.hot_players
            }
            _ => {
                tracing::warn!("No hot player data, tracking every player");
                Vec::new()
            }
        }
    }
}

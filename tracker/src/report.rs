//! Console rendering for the `bullrun` subcommands.

use std::fmt::Write;

use itertools::Itertools;
use types::{DeckRecord, PlayerDescriptor};

use crate::{
    deck_tracker::{PruneReport, TrackerStats},
    hot_players::CardSimilarity,
    round_manager::{NextUpdateInfo, RoundState},
};

/// Decks shown by `history`.
pub const HISTORY_DISPLAY_LIMIT: usize = 10;

const RULE_WIDTH: usize = 40;

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

fn join_or_none<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().join(", ")
    }
}

pub fn format_deck(deck: &DeckRecord) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        if deck.is_update {
            "UPDATED DECK"
        } else {
            "NEW DECK"
        },
    );
    let _ = writeln!(out, "Player:    {}", deck.username);
    let _ = writeln!(out, "Status:    {} ({} appearances)", deck.status, deck.appearances);
    let _ = writeln!(out, "Cards:     {}", join_or_none(&deck.cards));
    let _ = writeln!(out, "Modifiers: {}", join_or_none(&deck.modifiers));
    let _ = writeln!(out, "Created:   {}", deck.created_at.to_rfc3339());
    let _ = writeln!(out, "Round:     {}", deck.round_id);
    out
}

pub fn format_tracker_stats(stats: &TrackerStats) -> String {
    let mut out = String::new();
    heading(&mut out, "DECK TRACKER");
    let _ = writeln!(out, "Players with processed decks: {}", stats.total_players);
    let _ = writeln!(out, "Processed decks:              {}", stats.total_processed_decks);
    let _ = writeln!(out, "Players with history:         {}", stats.players_with_history);
    let _ = writeln!(out, "Decks in history:             {}", stats.total_history_decks);
    out
}

pub fn format_round_status(state: &RoundState, next: &NextUpdateInfo, auto_update: bool) -> String {
    let mut out = String::new();
    heading(&mut out, "ROUND MANAGER");
    let _ = writeln!(out, "Current round:  {}", state.current_round_id);
    let _ = writeln!(out, "Last update:    {}", state.last_update_date);
    let _ = writeln!(out, "Next update:    {}", next.next_update.to_rfc3339());
    let _ = writeln!(out, "Time to update: {}", next.time_until_display());
    let _ = writeln!(out, "Next round:     {}", next.next_round);
    let _ = writeln!(out, "Auto update:    {}", if auto_update { "active" } else { "stopped" });
    out
}

pub fn format_next_update(next: &NextUpdateInfo) -> String {
    let mut out = String::new();
    heading(&mut out, "NEXT ROUND UPDATE");
    let _ = writeln!(out, "Current round:  {}", next.current_round);
    let _ = writeln!(out, "Next round:     {}", next.next_round);
    let _ = writeln!(out, "Update at:      {}", next.next_update.to_rfc3339());
    let _ = writeln!(out, "Time to update: {}", next.time_until_display());
    out
}

pub fn format_stats(
    stats: &TrackerStats,
    state: &RoundState,
    next: &NextUpdateInfo,
    hot_players: usize,
    monitoring: bool,
) -> String {
    let mut out = String::new();
    heading(&mut out, "STATS");
    let _ = writeln!(out, "Hot players:   {hot_players}");
    let _ = writeln!(out, "Monitoring:    {}", if monitoring { "active" } else { "stopped" });
    let _ = writeln!(out, "Current round: {}", state.current_round_id);
    out.push('\n');
    out.push_str(&format_round_status(state, next, monitoring));
    out.push('\n');
    out.push_str(&format_tracker_stats(stats));
    out
}

pub fn format_history(username: &str, records: &[DeckRecord]) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("DECK HISTORY: {username}"));
    if records.is_empty() {
        let _ = writeln!(out, "No decks recorded for {username}");
        return out;
    }
    let _ = writeln!(out, "Total decks: {}", records.len());
    for (i, deck) in records.iter().take(HISTORY_DISPLAY_LIMIT).enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}. Round {}{}",
            i + 1,
            deck.round_id,
            if deck.is_update { " (updated)" } else { "" }
        );
        let _ = writeln!(out, "   Status:    {}", deck.status);
        let _ = writeln!(out, "   Cards:     {}", join_or_none(&deck.cards));
        let _ = writeln!(out, "   Modifiers: {}", join_or_none(&deck.modifiers));
        let _ = writeln!(out, "   Created:   {}", deck.created_at.to_rfc3339());
    }
    if records.len() > HISTORY_DISPLAY_LIMIT {
        let _ = writeln!(out);
        let _ = writeln!(out, "... and {} more", records.len() - HISTORY_DISPLAY_LIMIT);
    }
    out
}

pub fn format_hot_players(players: &[PlayerDescriptor], limit: usize) -> String {
    let mut out = String::new();
    heading(&mut out, "HOT PLAYERS");
    if players.is_empty() {
        let _ = writeln!(out, "No hot players, tracking everyone");
        return out;
    }
    for (i, player) in players.iter().take(limit).enumerate() {
        let shown = player.cards.iter().take(5).join(", ");
        let more = if player.cards.len() > 5 { "..." } else { "" };
        let _ = writeln!(out, "{}. {}", i + 1, player.username);
        let _ = writeln!(out, "   Appearances:   {}", player.appearances);
        let _ = writeln!(
            out,
            "   Best position: {}",
            player
                .best_position
                .map_or_else(|| "N/A".to_string(), |p| p.to_string())
        );
        let _ = writeln!(
            out,
            "   Last round:    {}",
            player
                .last_seen
                .map_or_else(|| "N/A".to_string(), |r| r.to_string())
        );
        let _ = writeln!(out, "   Cards:         {shown}{more}");
    }
    out
}

pub fn format_similarities(similarities: &[CardSimilarity], limit: usize) -> String {
    let mut out = String::new();
    heading(&mut out, "CARD SIMILARITY");
    for pair in similarities.iter().take(limit) {
        let _ = writeln!(
            out,
            "{} / {}: {:.0}% ({} shared: {})",
            pair.player1,
            pair.player2,
            pair.similarity * 100.0,
            pair.common_count,
            pair.common_cards.iter().join(", ")
        );
    }
    out
}

pub fn format_prune_report(report: &PruneReport, days: u32) -> String {
    if report.is_empty() {
        format!("Nothing older than {days} days")
    } else {
        format!(
            "Removed {} processed ids and {} history records older than {days} days",
            report.processed_removed, report.history_removed
        )
    }
}

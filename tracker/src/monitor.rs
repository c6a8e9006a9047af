use std::{sync::Arc, time::Duration};

use client::PlaySource;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use types::PlayerDescriptor;

use crate::{
    config::TrackerConfig,
    deck_tracker::{ClassifiedDecks, DeckTracker},
    play_log::PlayLog,
    round_manager::{RoundManager, RoundUpdate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub round_check_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            round_check_interval: Duration::from_secs(60),
        }
    }
}

impl From<&TrackerConfig> for MonitorSettings {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            round_check_interval: config.round_check_interval,
        }
    }
}

#[derive(Clone)]
struct Shared {
    tracker: Arc<Mutex<DeckTracker>>,
    rounds: Arc<Mutex<RoundManager>>,
    source: Arc<dyn PlaySource>,
    play_log: PlayLog,
    hot_players: Arc<Vec<PlayerDescriptor>>,
}

impl Shared {
    async fn poll_once(&self) -> ClassifiedDecks {
        let round_id = self.rounds.lock().await.current_round();
        let plays = self.source.fetch_plays_for_round(round_id).await;
        if plays.is_empty() {
            return ClassifiedDecks::default();
        }
        tracing::debug!(round_id, plays = plays.len(), "Checking latest plays");

        let classified = self
            .tracker
            .lock()
            .await
            .classify(&plays, &self.hot_players)
            .await;
        if classified.is_empty() {
            return classified;
        }

        for deck in classified.iter() {
            tracing::info!(update = deck.is_update, "{deck}");
        }
        self.play_log.append_all(classified.iter()).await;
        tracing::info!(
            new = classified.new_decks.len(),
            updated = classified.updated_decks.len(),
            "Processed latest plays"
        );
        classified
    }

    async fn check_round(&self) -> Option<RoundUpdate> {
        self.rounds.lock().await.check_for_round_update().await
    }
}

/// Runs the poll loop and the round check as two cancellable tasks.
pub struct Monitor {
    shared: Shared,
    settings: MonitorSettings,
    shutdown: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(
        tracker: Arc<Mutex<DeckTracker>>,
        rounds: Arc<Mutex<RoundManager>>,
        source: Arc<dyn PlaySource>,
        play_log: PlayLog,
        hot_players: Vec<PlayerDescriptor>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            shared: Shared {
                tracker,
                rounds,
                source,
                play_log,
                hot_players: Arc::new(hot_players),
            },
            settings,
            shutdown: None,
            tasks: Vec::new(),
        }
    }

    pub fn hot_players(&self) -> &[PlayerDescriptor] {
        &self.shared.hot_players
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Fetches the current round's latest plays once and records anything
    /// new.
    pub async fn poll_once(&self) -> ClassifiedDecks {
        self.shared.poll_once().await
    }

    /// Spawns both tasks. Each fires once right away, then on its interval.
    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("Monitor already running");
            return;
        }
        tracing::info!(
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            round_check_interval_ms = self.settings.round_check_interval.as_millis() as u64,
            "Starting monitor"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let shared = self.shared.clone();
        let mut shutdown = shutdown_rx.clone();
        let poll_interval = self.settings.poll_interval;
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        shared.poll_once().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!("Poll task stopped");
        }));

        let shared = self.shared.clone();
        let mut shutdown = shutdown_rx;
        let check_interval = self.settings.round_check_interval;
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        shared.check_round().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!("Round check task stopped");
        }));

        self.shutdown = Some(shutdown_tx);
    }

    /// Signals both tasks and waits for them to finish their current cycle.
    pub async fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            tracing::warn!("Monitor not running");
            return;
        };
        let _ = shutdown.send(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Monitor task failed");
            }
        }
        tracing::info!("Monitor stopped");
    }
}

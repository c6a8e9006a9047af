use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use storage::{keys, load_document, save_document, JsonStore, RoundStateDocument, RoundUpdateRecord, TIMEZONE_UTC};
use types::RoundId;

use crate::clock::Clock;

/// Round tracked when nothing has been persisted yet.
pub const DEFAULT_ROUND_ID: RoundId = 359;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    pub current_round_id: RoundId,
    pub last_update_date: NaiveDate,
}

/// Outcome of one timed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundCheck {
    NotRolloverMinute,
    AlreadyAdvancedToday,
    Advance { today: NaiveDate },
}

/// The round advances during the 00:00 UTC minute, once per date.
pub fn evaluate_rollover(now: DateTime<Utc>, last_update_date: NaiveDate) -> RoundCheck {
    if now.hour() != 0 || now.minute() != 0 {
        return RoundCheck::NotRolloverMinute;
    }
    let today = now.date_naive();
    if today == last_update_date {
        RoundCheck::AlreadyAdvancedToday
    } else {
        RoundCheck::Advance { today }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundUpdate {
    pub old_round_id: RoundId,
    pub new_round_id: RoundId,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUpdateInfo {
    pub next_update: DateTime<Utc>,
    pub time_until_update: Duration,
    pub current_round: RoundId,
    pub next_round: RoundId,
}

impl NextUpdateInfo {
    /// Remaining time as `"{h}h {m}m"`.
    pub fn time_until_display(&self) -> String {
        let minutes = self.time_until_update.num_minutes();
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

impl Display for NextUpdateInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "round {} -> {} at {} (in {})",
            self.current_round,
            self.next_round,
            self.next_update.to_rfc3339(),
            self.time_until_display()
        )
    }
}

/// Owns the active round id and advances it once per UTC day.
#[derive(Debug)]
pub struct RoundManager {
    state: RoundState,
    store: Arc<dyn JsonStore>,
    clock: Arc<dyn Clock>,
}

impl RoundManager {
    pub fn new(state: RoundState, store: Arc<dyn JsonStore>, clock: Arc<dyn Clock>) -> Self {
        Self { state, store, clock }
    }

    /// Reads the persisted round. A missing, unreadable or zero round falls
    /// back to `default_round_id`. The last update date always starts as
    /// today.
    pub async fn initialize(store: Arc<dyn JsonStore>, clock: Arc<dyn Clock>, default_round_id: RoundId) -> Self {
        let current_round_id = load_document::<RoundStateDocument>(store.as_ref(), keys::CURRENT_ROUND)
            .await
            .map(|document| document.current_round_id)
            .filter(|&round_id| round_id > 0)
            .unwrap_or(default_round_id);
        let state = RoundState {
            current_round_id,
            last_update_date: clock.today(),
        };
        tracing::info!(
            round_id = state.current_round_id,
            last_update_date = %state.last_update_date,
            "Round manager initialized"
        );
        Self::new(state, store, clock)
    }

    pub fn current_round(&self) -> RoundId {
        self.state.current_round_id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Runs one timed check and advances the round when it is due.
    pub async fn check_for_round_update(&mut self) -> Option<RoundUpdate> {
        match evaluate_rollover(self.clock.now(), self.state.last_update_date) {
            RoundCheck::Advance { .. } => Some(self.advance().await),
            RoundCheck::NotRolloverMinute | RoundCheck::AlreadyAdvancedToday => None,
        }
    }

    pub async fn force_update_round(&mut self) -> RoundUpdate {
        tracing::info!(round_id = self.state.current_round_id, "Forcing round update");
        self.advance().await
    }

    async fn advance(&mut self) -> RoundUpdate {
        let now = self.clock.now();
        let update = RoundUpdate {
            old_round_id: self.state.current_round_id,
            new_round_id: self.state.current_round_id + 1,
            updated_at: now,
        };
        self.state.current_round_id = update.new_round_id;
        self.state.last_update_date = now.date_naive();
        tracing::info!(
            old_round_id = update.old_round_id,
            new_round_id = update.new_round_id,
            "Round advanced"
        );

        let document = RoundStateDocument {
            current_round_id: self.state.current_round_id,
            last_updated: now,
            timezone: TIMEZONE_UTC.to_string(),
            last_update_date: Some(self.state.last_update_date),
        };
        save_document(self.store.as_ref(), keys::CURRENT_ROUND, &document).await;
        self.append_audit_record(&update).await;
        update
    }

    async fn append_audit_record(&self, update: &RoundUpdate) {
        let mut records: Vec<RoundUpdateRecord> = load_document(self.store.as_ref(), keys::ROUND_UPDATES)
            .await
            .unwrap_or_default();
        records.push(RoundUpdateRecord {
            old_round_id: update.old_round_id,
            new_round_id: update.new_round_id,
            updated_at: update.updated_at,
            timezone: TIMEZONE_UTC.to_string(),
        });
        if save_document(self.store.as_ref(), keys::ROUND_UPDATES, &records).await {
            tracing::debug!(records = records.len(), "Round update logged");
        }
    }

    /// Next 00:00 UTC and the time left until then.
    pub fn next_update_info(&self) -> NextUpdateInfo {
        let now = self.clock.now();
        let next_update = (now.date_naive() + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);
        NextUpdateInfo {
            next_update,
            time_until_update: next_update - now,
            current_round: self.state.current_round_id,
            next_round: self.state.current_round_id + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use storage::MemoryStore;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_evaluate_rollover() {
        assert_eq!(
            evaluate_rollover(at(2024, 1, 2, 0, 0, 30), date(2024, 1, 1)),
            RoundCheck::Advance {
                today: date(2024, 1, 2)
            }
        );
        assert_eq!(
            evaluate_rollover(at(2024, 1, 2, 0, 0, 30), date(2024, 1, 2)),
            RoundCheck::AlreadyAdvancedToday
        );
        assert_eq!(
            evaluate_rollover(at(2024, 1, 2, 0, 1, 0), date(2024, 1, 1)),
            RoundCheck::NotRolloverMinute
        );
        assert_eq!(
            evaluate_rollover(at(2024, 1, 2, 12, 0, 0), date(2024, 1, 1)),
            RoundCheck::NotRolloverMinute
        );
    }

    #[tokio::test]
    async fn test_initialize_defaults_and_ignores_zero_round() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 18, 0, 0)));
        let manager = RoundManager::initialize(store.clone(), clock.clone(), DEFAULT_ROUND_ID).await;
        assert_eq!(manager.current_round(), 359);
        assert_eq!(manager.state().last_update_date, date(2024, 1, 1));

        store
            .save_json(
                keys::CURRENT_ROUND,
                &serde_json::json!({"currentRoundId": 0, "lastUpdated": "2024-01-01T00:00:00Z"}),
            )
            .await
            .unwrap();
        let manager = RoundManager::initialize(store, clock, 400).await;
        assert_eq!(manager.current_round(), 400);
    }

    #[tokio::test]
    async fn test_force_update_persists_and_logs() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(at(2024, 1, 5, 9, 30, 0)));
        let mut manager = RoundManager::initialize(store.clone(), clock, 370).await;

        let update = manager.force_update_round().await;
        assert_eq!((update.old_round_id, update.new_round_id), (370, 371));
        manager.force_update_round().await;

        let state: RoundStateDocument = load_document(store.as_ref(), keys::CURRENT_ROUND)
            .await
            .unwrap();
        assert_eq!(state.current_round_id, 372);
        assert_eq!(state.timezone, "UTC");

        let log: Vec<RoundUpdateRecord> = load_document(store.as_ref(), keys::ROUND_UPDATES)
            .await
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].old_round_id, 371);
    }

    #[test]
    fn test_next_update_info() {
        let clock = Arc::new(ManualClock::new(at(2024, 1, 2, 21, 15, 20)));
        let manager = RoundManager::new(
            RoundState {
                current_round_id: 360,
                last_update_date: date(2024, 1, 2),
            },
            Arc::new(MemoryStore::new()),
            clock,
        );
        let info = manager.next_update_info();
        assert_eq!(info.next_update, at(2024, 1, 3, 0, 0, 0));
        assert_eq!(info.time_until_display(), "2h 44m");
        assert_eq!(info.next_round, 361);
    }
}

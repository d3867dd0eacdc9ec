//! Score engine: the only code that mutates a [`ScoreRecord`].
//!
//! Every mutation is followed by a full-record write and an
//! [`Event::ScoreUpdated`] notification. Storage failures are logged and
//! swallowed; the in-memory record stays authoritative until the next
//! successful write.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::migration;
use super::motivation::{motivational_message, StreakTier};
use super::record::{ScoreRecord, StatsView};
use super::streak::{self, StreakTransition};
use crate::clock::Clock;
use crate::events::{Event, EventBus, EventKind};
use crate::storage::ScoreStore;

/// Result of [`ScoreEngine::complete_challenge`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// `smile_time` beat the previous longest smile.
    pub is_new_record: bool,
    /// This was the first completion of the calendar day.
    pub first_of_day: bool,
    /// Streak change; `Unchanged` for repeat completions.
    pub transition: StreakTransition,
    pub current_day_streak: u32,
}

pub struct ScoreEngine {
    store: Box<dyn ScoreStore>,
    key: String,
    clock: Arc<dyn Clock>,
    record: ScoreRecord,
    bus: EventBus,
}

impl ScoreEngine {
    /// Create an engine and load the stored record.
    pub fn new(store: Box<dyn ScoreStore>, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let mut engine = Self {
            store,
            key: key.into(),
            clock,
            record: ScoreRecord::default(),
            bus: EventBus::new(),
        };
        engine.load();
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Raw record as last mutated. `today_completed` may be stale; use
    /// [`stats`](Self::stats) for display.
    pub fn record(&self) -> &ScoreRecord {
        &self.record
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fresh statistics snapshot. Recomputes `today_completed` first.
    pub fn stats(&mut self) -> StatsView {
        self.refresh_today();
        self.record.to_stats()
    }

    pub fn has_completed_today(&mut self) -> bool {
        self.refresh_today();
        self.record.today_completed
    }

    /// Whether `smile_time` would beat the current longest smile.
    ///
    /// Call before [`complete_challenge`](Self::complete_challenge).
    pub fn is_new_record(&self, smile_time: f64) -> bool {
        smile_time > self.record.longest_smile
    }

    /// Message for the current streak. Recomputes `today_completed` first.
    pub fn motivational_message(&mut self) -> String {
        self.refresh_today();
        motivational_message(self.record.current_day_streak, !self.record.today_completed)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(kind, handler);
    }

    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe_all(handler);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Re-read the record from storage, migrating older shapes.
    ///
    /// Absent or unreadable data yields defaults. A record that needed
    /// migration or coercion is written back once in normalized form.
    pub fn load(&mut self) -> ScoreRecord {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, "failed to read score data: {e}");
                None
            }
        };

        self.record = match raw.as_deref().map(migration::migrate_str) {
            None => ScoreRecord::default(),
            Some(None) => {
                warn!(key = %self.key, "stored score data is not a JSON object; using defaults");
                ScoreRecord::default()
            }
            Some(Some(migrated)) => {
                let changed = migrated.changed;
                self.record = migrated.record;
                if changed {
                    debug!(key = %self.key, "normalized stored score data");
                    self.persist();
                }
                self.record.clone()
            }
        };
        self.record.clone()
    }

    /// Register a camera session start.
    pub fn start_session(&mut self) {
        let today = self.clock.today();

        if let Some(lost) = streak::decay_for_inactivity(&mut self.record, today) {
            if lost > 0 {
                info!(lost, "day streak broken by inactivity");
            }
        }

        self.record.total_sessions = self.record.total_sessions.saturating_add(1);
        self.record.last_play_date = Some(today);
        self.record.refresh_today(today);
        debug!(total_sessions = self.record.total_sessions, "session started");

        self.persist();
        let stats = self.record.to_stats();
        self.bus.publish(&Event::SessionStarted {
            stats: stats.clone(),
        });
        self.bus.publish(&Event::ScoreUpdated { stats });
    }

    /// Record a completed challenge of `smile_time` seconds.
    ///
    /// Negative or non-finite durations count as zero. The day streak
    /// only moves on the first completion of a calendar day.
    pub fn complete_challenge(&mut self, smile_time: f64) -> CompletionOutcome {
        let smile_time = if smile_time.is_finite() {
            smile_time.max(0.0)
        } else {
            0.0
        };
        let today = self.clock.today();
        self.refresh_today();

        let is_new_record = self.is_new_record(smile_time);
        let first_of_day = !self.record.today_completed;

        self.record.challenges_completed = self.record.challenges_completed.saturating_add(1);
        self.record.total_smile_time += smile_time;
        if is_new_record {
            self.record.longest_smile = smile_time;
        }

        let transition = if first_of_day {
            self.record.today_completed = true;
            let tier_before = StreakTier::for_streak(self.record.current_day_streak);
            let transition = streak::advance(&mut self.record, today);
            let tier = StreakTier::for_streak(self.record.current_day_streak);
            if transition == StreakTransition::Extended && tier != tier_before {
                info!(?tier, day_streak = self.record.current_day_streak, "streak milestone reached");
            }
            self.record.last_completion_date = Some(today);
            info!(
                day_streak = self.record.current_day_streak,
                "first challenge of the day completed"
            );
            transition
        } else {
            info!(
                challenges = self.record.challenges_completed,
                "another challenge completed today"
            );
            StreakTransition::Unchanged
        };

        self.persist();
        self.notify();

        CompletionOutcome {
            is_new_record,
            first_of_day,
            transition,
            current_day_streak: self.record.current_day_streak,
        }
    }

    /// Restore every field to its default.
    pub fn reset_score(&mut self) {
        self.record = ScoreRecord::default();
        self.persist();
        self.notify();
    }

    /// Delete the stored record entirely and reset in-memory state.
    pub fn clear_stored_data(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!(key = %self.key, "failed to remove score data: {e}");
        }
        self.record = ScoreRecord::default();
        self.notify();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn refresh_today(&mut self) {
        let today = self.clock.today();
        self.record.refresh_today(today);
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.record) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize score data: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &json) {
            warn!(key = %self.key, "failed to save score data: {e}");
        }
    }

    fn notify(&mut self) {
        let stats = self.stats();
        self.bus.publish(&Event::ScoreUpdated { stats });
    }
}

impl std::fmt::Debug for ScoreEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreEngine")
            .field("key", &self.key)
            .field("record", &self.record)
            .finish()
    }
}

//! Smile timer implementation.
//!
//! The timer is a clock-driven state machine. It does not use internal
//! threads - the caller is responsible for calling `update()` once per
//! processed video frame. Elapsed time comes from clock deltas, not tick
//! counts, so accuracy does not depend on frame rate.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> GoalReached -> Idle
//!           \__________________/
//!                reset()
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SmileTimer::new(clock, 15.0);
//! timer.start();
//! // Once per frame:
//! let tick = timer.update(); // tick.goal_reached() is true exactly once per run
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
    /// Still running; the goal event has already fired for this run.
    GoalReached,
}

/// Serializable snapshot of the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub active: bool,
    /// Monotonic start reference in milliseconds.
    pub start_ms: Option<u64>,
    pub elapsed_secs: f64,
    pub goal_reached: bool,
}

/// Outcome of one [`SmileTimer::update`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerTick {
    pub elapsed_secs: f64,
    pub events: Vec<Event>,
}

impl TimerTick {
    fn idle() -> Self {
        Self {
            elapsed_secs: 0.0,
            events: Vec::new(),
        }
    }

    /// The goal was crossed on this tick.
    pub fn goal_reached(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::GoalReached { .. }))
    }
}

/// Tracks how long the current smile has lasted.
pub struct SmileTimer {
    clock: Arc<dyn Clock>,
    goal_seconds: f64,
    start: Option<Duration>,
    elapsed_secs: f64,
    goal_reached: bool,
}

impl SmileTimer {
    pub fn new(clock: Arc<dyn Clock>, goal_seconds: f64) -> Self {
        Self {
            clock,
            goal_seconds,
            start: None,
            elapsed_secs: 0.0,
            goal_reached: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        match (self.start.is_some(), self.goal_reached) {
            (false, _) => TimerPhase::Idle,
            (true, false) => TimerPhase::Running,
            (true, true) => TimerPhase::GoalReached,
        }
    }

    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }

    pub fn has_reached_goal(&self) -> bool {
        self.goal_reached
    }

    /// Elapsed seconds as of the last `update()`.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn goal_seconds(&self) -> f64 {
        self.goal_seconds
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            active: self.is_running(),
            start_ms: self.start.map(|d| d.as_millis() as u64),
            elapsed_secs: self.elapsed_secs,
            goal_reached: self.goal_reached,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin timing. Returns `None` if already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        self.start = Some(self.clock.now());
        self.elapsed_secs = 0.0;
        self.goal_reached = false;
        Some(Event::TimerStarted)
    }

    /// Recompute elapsed time. Emits `TimerUpdated` and, the first time
    /// the goal is crossed in this run, `GoalReached`.
    pub fn update(&mut self) -> TimerTick {
        let Some(start) = self.start else {
            return TimerTick::idle();
        };

        let elapsed = self.clock.now().saturating_sub(start).as_secs_f64();
        self.elapsed_secs = self.elapsed_secs.max(elapsed);

        let mut events = vec![Event::TimerUpdated {
            elapsed_secs: self.elapsed_secs,
        }];

        if !self.goal_reached && self.elapsed_secs >= self.goal_seconds {
            self.goal_reached = true;
            events.push(Event::GoalReached {
                elapsed_secs: self.elapsed_secs,
            });
        }

        TimerTick {
            elapsed_secs: self.elapsed_secs,
            events,
        }
    }

    /// Stop and clear all state.
    pub fn reset(&mut self) -> Event {
        self.start = None;
        self.elapsed_secs = 0.0;
        self.goal_reached = false;
        Event::TimerReset
    }
}

impl std::fmt::Debug for SmileTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmileTimer")
            .field("goal_seconds", &self.goal_seconds)
            .field("state", &self.state())
            .finish()
    }
}

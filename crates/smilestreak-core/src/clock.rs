//! Injectable time sources.
//!
//! The timer needs a monotonic reference and the score engine needs the
//! current calendar date. Both come from a [`Clock`] so tests can drive
//! time explicitly instead of sleeping.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which calendar decides when "today" rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    #[default]
    Utc,
    Local,
}

pub trait Clock: Send + Sync {
    /// Monotonic time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock backed by [`Instant`] and chrono.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    boundary: DayBoundary,
}

impl SystemClock {
    pub fn new(boundary: DayBoundary) -> Self {
        Self {
            origin: Instant::now(),
            boundary,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DayBoundary::default())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn today(&self) -> NaiveDate {
        match self.boundary {
            DayBoundary::Utc => Utc::now().date_naive(),
            DayBoundary::Local => Local::now().date_naive(),
        }
    }
}

/// Hand-driven clock for tests and frame-script replays.
///
/// Shared by reference (usually inside an `Arc`), so all mutation goes
/// through atomics.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
    days_from_ce: AtomicI32,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now_ms: AtomicU64::new(0),
            days_from_ce: AtomicI32::new(today.num_days_from_ce()),
        }
    }

    /// Set the monotonic time in milliseconds. Values earlier than the
    /// current reading are ignored.
    pub fn set_ms(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_today(&self, date: NaiveDate) {
        self.days_from_ce
            .store(date.num_days_from_ce(), Ordering::SeqCst);
    }

    /// Move the calendar forward (or back, for negative values) by whole days.
    pub fn advance_days(&self, days: i32) {
        self.days_from_ce.fetch_add(days, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }

    fn today(&self) -> NaiveDate {
        let days = self.days_from_ce.load(Ordering::SeqCst);
        NaiveDate::from_num_days_from_ce_opt(days).unwrap_or_default()
    }
}

//! Calendar-day streak rules.
//!
//! A day streak counts consecutive calendar days with at least one
//! completed challenge. It advances only on the first completion of a
//! day, and it decays to zero when a session starts after a gap of two
//! or more days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::ScoreRecord;

/// What the first completion of a day did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// First completion ever.
    Started,
    /// Previous completion was yesterday.
    Extended,
    /// A day or more was skipped; the streak restarts at 1.
    Restarted { previous: u32 },
    /// Today was already counted.
    Unchanged,
}

/// Signed whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn is_consecutive(previous: NaiveDate, today: NaiveDate) -> bool {
    days_between(previous, today) == 1
}

/// Apply the day-streak transition for a completion on `today`.
///
/// Does not touch `last_completion_date`; the caller sets it afterwards.
pub fn advance(record: &mut ScoreRecord, today: NaiveDate) -> StreakTransition {
    let transition = match record.last_completion_date {
        None => {
            record.current_day_streak = 1;
            StreakTransition::Started
        }
        Some(last) if last == today => return StreakTransition::Unchanged,
        Some(last) if is_consecutive(last, today) => {
            record.current_day_streak = record.current_day_streak.saturating_add(1);
            StreakTransition::Extended
        }
        Some(_) => {
            let previous = record.current_day_streak;
            record.current_day_streak = 1;
            StreakTransition::Restarted { previous }
        }
    };

    record.best_day_streak = record.best_day_streak.max(record.current_day_streak);
    transition
}

/// Zero the streak if the last completion is neither today nor yesterday.
///
/// Returns the streak value that was lost, if any. A completion date in
/// the future (clock moved backwards) counts as a gap.
pub fn decay_for_inactivity(record: &mut ScoreRecord, today: NaiveDate) -> Option<u32> {
    let last = record.last_completion_date?;
    if last == today || is_consecutive(last, today) {
        return None;
    }
    let lost = record.current_day_streak;
    record.current_day_streak = 0;
    Some(lost)
}

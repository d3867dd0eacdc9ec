//! Upgrade persisted score JSON to the current [`ScoreRecord`] shape.
//!
//! Older clients stored a per-session `currentStreak` / `bestStreak`
//! instead of day streaks, and browser storage may hold strings, nulls or
//! negative numbers where numbers are expected. Everything is coerced;
//! nothing here returns an error.
//!
//! Migration is additive and idempotent: fields that already carry a
//! non-default value under the current schema are never overwritten, and
//! the output contains no legacy keys, so migrating twice is a no-op.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::record::ScoreRecord;

/// Legacy best streaks were session counts; cap them when converting to days.
pub const LEGACY_BEST_STREAK_CAP: u32 = 30;

const LEGACY_CURRENT_STREAK: &str = "currentStreak";
const LEGACY_BEST_STREAK: &str = "bestStreak";

/// Result of a migration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub record: ScoreRecord,
    /// The stored JSON differs from the normalized record and should be
    /// written back.
    pub changed: bool,
}

/// Parse and migrate a raw stored string. `None` means the text was not a
/// JSON object and the caller should fall back to defaults.
pub fn migrate_str(raw: &str) -> Option<Migration> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;
    let record = migrate_object(obj);
    let changed = serde_json::to_value(&record)
        .map(|normalized| normalized != value)
        .unwrap_or(true);
    Some(Migration { record, changed })
}

/// Build a record from an arbitrary JSON object.
pub fn migrate_object(obj: &Map<String, Value>) -> ScoreRecord {
    let mut record = ScoreRecord {
        challenges_completed: count(obj.get("challengesCompleted")),
        total_smile_time: seconds(obj.get("totalSmileTime")),
        longest_smile: seconds(obj.get("longestSmile")),
        current_day_streak: count(obj.get("currentDayStreak")),
        best_day_streak: count(obj.get("bestDayStreak")),
        last_play_date: date(obj.get("lastPlayDate")),
        last_completion_date: date(obj.get("lastCompletionDate")),
        total_sessions: count(obj.get("totalSessions")),
        today_completed: truthy(obj.get("todayCompleted")),
    };

    if let Some(legacy) = obj.get(LEGACY_CURRENT_STREAK) {
        if record.current_day_streak == 0 {
            // A running session streak only proves the user played at least one day.
            record.current_day_streak = u32::from(number(Some(legacy)) > 0.0);
        }
    }

    if let Some(legacy) = obj.get(LEGACY_BEST_STREAK) {
        if record.best_day_streak == 0 {
            record.best_day_streak = count(Some(legacy)).min(LEGACY_BEST_STREAK_CAP);
        }
    }

    record.best_day_streak = record.best_day_streak.max(record.current_day_streak);
    record
}

/// Loose numeric reading: numbers, numeric strings and booleans count;
/// anything else, NaN, infinities and negatives read as 0.
fn number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

fn seconds(value: Option<&Value>) -> f64 {
    number(value)
}

fn count(value: Option<&Value>) -> u32 {
    let n = number(value).floor();
    if n >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        n as u32
    }
}

fn date(value: Option<&Value>) -> Option<NaiveDate> {
    let s = value?.as_str()?;
    // Accept full ISO timestamps too; only the date part matters.
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted score data, one per user/device.
///
/// Serialized as camelCase JSON so records written by older clients
/// load without translation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub challenges_completed: u32,
    /// Seconds, summed over completed challenges.
    pub total_smile_time: f64,
    /// Seconds, best single challenge.
    pub longest_smile: f64,
    pub current_day_streak: u32,
    pub best_day_streak: u32,
    pub last_play_date: Option<NaiveDate>,
    pub last_completion_date: Option<NaiveDate>,
    pub total_sessions: u32,
    /// Cached `last_completion_date == today`. Recompute before trusting it.
    pub today_completed: bool,
}

impl ScoreRecord {
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.last_completion_date == Some(day)
    }

    pub fn refresh_today(&mut self, today: NaiveDate) {
        self.today_completed = self.completed_on(today);
    }

    pub fn average_smile_time(&self) -> f64 {
        if self.challenges_completed == 0 {
            0.0
        } else {
            self.total_smile_time / f64::from(self.challenges_completed)
        }
    }

    /// Display snapshot. Call [`refresh_today`](Self::refresh_today) first.
    pub fn to_stats(&self) -> StatsView {
        StatsView {
            challenges_completed: self.challenges_completed,
            total_sessions: self.total_sessions,
            average_smile_time: round1(self.average_smile_time()),
            longest_smile: round1(self.longest_smile),
            current_day_streak: self.current_day_streak,
            best_day_streak: self.best_day_streak,
            total_smile_time: round1(self.total_smile_time),
            today_completed: self.today_completed,
            last_completion_date: self.last_completion_date,
            last_play_date: self.last_play_date,
        }
    }
}

/// Read-only statistics handed to rendering layers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub challenges_completed: u32,
    pub total_sessions: u32,
    pub average_smile_time: f64,
    pub longest_smile: f64,
    pub current_day_streak: u32,
    pub best_day_streak: u32,
    pub total_smile_time: f64,
    pub today_completed: bool,
    pub last_completion_date: Option<NaiveDate>,
    pub last_play_date: Option<NaiveDate>,
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

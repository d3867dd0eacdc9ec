//! Motivational messages keyed on the current day streak.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTier {
    None,
    FirstDay,
    Building,
    Week,
    Warrior,
    Legend,
    Transcendent,
}

impl StreakTier {
    pub fn for_streak(day_streak: u32) -> Self {
        match day_streak {
            0 => StreakTier::None,
            1 => StreakTier::FirstDay,
            2..=6 => StreakTier::Building,
            7..=13 => StreakTier::Week,
            14..=29 => StreakTier::Warrior,
            30..=99 => StreakTier::Legend,
            _ => StreakTier::Transcendent,
        }
    }
}

/// Message for the celebration screen.
///
/// `first_today` is true while today's challenge has not been counted
/// yet; it only changes the wording of the one-day tier.
pub fn motivational_message(day_streak: u32, first_today: bool) -> String {
    match StreakTier::for_streak(day_streak) {
        StreakTier::None => "Start your daily smile journey! 😊".to_string(),
        StreakTier::FirstDay => {
            if first_today {
                "Day one of your streak! Come back tomorrow! 🌟".to_string()
            } else {
                "Congratulations! You completed today's challenge! 🎉".to_string()
            }
        }
        StreakTier::Building => {
            format!("{day_streak} days in a row! You're building a habit! 💪")
        }
        StreakTier::Week => {
            format!("A full week! {day_streak} days straight! Amazing! 🏆")
        }
        StreakTier::Warrior => {
            format!("{day_streak} days! You're a true happiness warrior! 👑")
        }
        StreakTier::Legend => {
            format!("{day_streak} days in a row! LEGENDARY! Smile Master! 🎭✨")
        }
        StreakTier::Transcendent => {
            format!("{day_streak} DAYS! You've transcended! Happiness Guru! 🌟👑✨")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(StreakTier::for_streak(0), StreakTier::None);
        assert_eq!(StreakTier::for_streak(1), StreakTier::FirstDay);
        assert_eq!(StreakTier::for_streak(2), StreakTier::Building);
        assert_eq!(StreakTier::for_streak(6), StreakTier::Building);
        assert_eq!(StreakTier::for_streak(7), StreakTier::Week);
        assert_eq!(StreakTier::for_streak(13), StreakTier::Week);
        assert_eq!(StreakTier::for_streak(14), StreakTier::Warrior);
        assert_eq!(StreakTier::for_streak(29), StreakTier::Warrior);
        assert_eq!(StreakTier::for_streak(30), StreakTier::Legend);
        assert_eq!(StreakTier::for_streak(99), StreakTier::Legend);
        assert_eq!(StreakTier::for_streak(100), StreakTier::Transcendent);
    }

    #[test]
    fn every_tier_has_a_distinct_message() {
        let samples = [0, 1, 3, 8, 20, 45, 150];
        let messages: std::collections::HashSet<String> = samples
            .iter()
            .map(|&s| motivational_message(s, false))
            .collect();
        assert_eq!(messages.len(), samples.len());
    }

    #[test]
    fn first_day_wording_depends_on_today() {
        assert_ne!(motivational_message(1, true), motivational_message(1, false));
        assert!(motivational_message(12, true).contains("12"));
    }
}

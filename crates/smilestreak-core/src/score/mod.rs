mod engine;
pub mod migration;
mod motivation;
mod record;
pub mod streak;

pub use engine::{CompletionOutcome, ScoreEngine};
pub use motivation::{motivational_message, StreakTier};
pub use record::{round1, ScoreRecord, StatsView};
pub use streak::StreakTransition;

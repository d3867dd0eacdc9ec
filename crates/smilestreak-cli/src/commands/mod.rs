pub mod config;
pub mod data;
pub mod reset;
pub mod session;
pub mod simulate;
pub mod stats;

use std::sync::Arc;

use smilestreak_core::storage::{self, Config};
use smilestreak_core::{Clock, ScoreEngine, SystemClock};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the score engine on the configured store with the system clock.
pub fn open_engine(config: &Config) -> Result<ScoreEngine, Box<dyn std::error::Error>> {
    let store = storage::open_store(&config.storage)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.calendar.day_boundary));
    Ok(ScoreEngine::new(store, config.storage.key.clone(), clock))
}

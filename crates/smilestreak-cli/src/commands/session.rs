use clap::Subcommand;
use smilestreak_core::Config;

use super::{open_engine, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Register a session start (applies streak decay)
    Start,
    /// Record a completed challenge
    Complete {
        /// Smile duration in seconds
        seconds: f64,
    },
}

pub fn run(action: SessionAction) -> CmdResult {
    let config = Config::load()?;
    let mut engine = open_engine(&config)?;

    match action {
        SessionAction::Start => {
            engine.start_session();
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
        }
        SessionAction::Complete { seconds } => {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(format!("invalid duration: {seconds}").into());
            }
            let outcome = engine.complete_challenge(seconds);
            let output = serde_json::json!({
                "outcome": outcome,
                "message": engine.motivational_message(),
                "stats": engine.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

use smilestreak_core::Config;

use super::{open_engine, CmdResult};

pub fn run(yes: bool) -> CmdResult {
    if !yes {
        return Err("refusing to reset all score data without --yes".into());
    }
    let config = Config::load()?;
    let mut engine = open_engine(&config)?;
    engine.reset_score();
    println!("score reset to defaults");
    Ok(())
}

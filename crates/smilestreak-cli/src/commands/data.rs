use clap::Subcommand;
use smilestreak_core::storage;
use smilestreak_core::Config;

use super::{open_engine, CmdResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Print the raw stored record
    Show,
    /// Delete the stored record
    Clear,
}

pub fn run(action: DataAction) -> CmdResult {
    let config = Config::load()?;

    match action {
        DataAction::Show => {
            // Read the store directly: opening the engine would migrate the record.
            let store = storage::open_store(&config.storage)?;
            match store.get(&config.storage.key)? {
                Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                    Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                    Err(_) => println!("{raw}"),
                },
                None => println!("no saved data"),
            }
        }
        DataAction::Clear => {
            let mut engine = open_engine(&config)?;
            engine.clear_stored_data();
            println!("saved data cleared");
        }
    }
    Ok(())
}

//! Persistent key-value storage for the score record.
//!
//! The score engine only sees the [`ScoreStore`] trait. Three backends
//! are provided: an in-memory map, a directory of JSON files and the
//! `kv` table of a SQLite database.

mod config;
pub mod database;
pub mod file;
pub mod memory;

pub use config::{
    CalendarConfig, CelebrationConfig, ChallengeConfig, Config, DetectionConfig, StorageBackend,
    StorageConfig,
};
pub use database::SqliteStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Durable string storage keyed by name.
///
/// Writes replace the whole value; there are no partial updates.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `SMILESTREAK_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/smilestreak[-dev]/`, with the `-dev` suffix selected by
/// `SMILESTREAK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("SMILESTREAK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("SMILESTREAK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("smilestreak-dev")
            } else {
                base_dir.join("smilestreak")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Open the backend selected in the configuration.
///
/// # Errors
/// Returns an error if the data directory or database cannot be opened.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn ScoreStore>, StorageError> {
    let store: Box<dyn ScoreStore> = match config.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::File => Box::new(FileStore::open(data_dir()?)?),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(data_dir()?.join("smilestreak.db"))?),
    };
    Ok(store)
}

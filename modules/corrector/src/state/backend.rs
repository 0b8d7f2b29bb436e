use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk shape of a bot's state. Field names are part of the file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    pub last_reset_date: NaiveDate,
    pub daily_count: u32,
    pub processed_ids: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not preserve corrupt state file {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a backend found when asked for the stored state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Missing,
    Loaded(StateFile),
    /// Stored bytes didn't parse. They were moved aside to `backup`.
    Corrupt { backup: String, reason: String },
}

/// Durable storage for one bot's state.
pub trait StateBackend: Send + Sync {
    fn load(&self) -> Result<LoadOutcome, StateError>;

    /// Replace the stored state. Must be all-or-nothing.
    fn save(&self, state: &StateFile) -> Result<(), StateError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

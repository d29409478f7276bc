//! Error types for quest loading and configuration.
//!
//! Quest handlers never fail: a missing or wrong-phase quest state is a
//! silent no-op. Errors only come from reading data and config files.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestError {
    /// A file or directory could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A TOML file did not match the expected layout
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A quest definition parsed but breaks a registration rule
    #[error("Invalid quest {quest_id}: {reason}")]
    InvalidDefinition { quest_id: u32, reason: String },

    /// The definition names a script kind this build does not ship
    #[error("Unknown quest script '{0}'")]
    UnknownScript(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The hot-reload watcher could not be started
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

impl QuestError {
    pub(crate) fn invalid(quest_id: u32, reason: impl Into<String>) -> Self {
        QuestError::InvalidDefinition {
            quest_id,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = QuestError> = std::result::Result<T, E>;

//! # Error Module
//!
//! Errors surfaced by the trainer core. Per-frame matching outcomes
//! (no note within tolerance, low clarity) are never errors; they are
//! plain `None` results from the matcher.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the trainer core.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// The microphone or audio device could not be opened. Fatal to the
    /// session: it stays stopped until the UI starts it again.
    #[error("audio input unavailable: {0}")]
    InputUnavailable(String),

    /// A note identifier that the catalog does not know.
    #[error("invalid note `{0}`")]
    InvalidNote(String),

    /// The operation needs a running session.
    #[error("no training session is active")]
    SessionInactive,

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrainerError>;

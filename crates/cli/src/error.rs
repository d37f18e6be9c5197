//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Profile file not found
    #[error("Scan profile not found: {path}")]
    ProfileNotFound { path: String },

    /// Tracker backend unavailable
    #[error("Tracker backend unavailable: {message}")]
    TrackerUnavailable { message: String },

    /// Scan engine error
    #[error(transparent)]
    Scan(#[from] contracts::ScanError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn profile_not_found(path: impl Into<String>) -> Self {
        Self::ProfileNotFound { path: path.into() }
    }

    pub fn tracker_unavailable(message: impl Into<String>) -> Self {
        Self::TrackerUnavailable {
            message: message.into(),
        }
    }
}

//! Core error types for shadowbox-core.
//!
//! Library errors are `thiserror` enums grouped by concern and folded into
//! [`CoreError`] through `#[from]` conversions.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for shadowbox-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Fight generation / playback start-up errors
    #[error("Fight error: {0}")]
    Fight(#[from] FightError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that prevent a fight session from starting.
///
/// `NoFightsLeft` is kept apart from `Network` so a host can offer an
/// upgrade path instead of a plain retry.
#[derive(Error, Debug)]
pub enum FightError {
    /// No moves to play once the countdown is stripped.
    #[error("no moves available for this fight")]
    EmptySequence,

    /// Quota or plan gate reported by the fight-generation service.
    #[error("no fights left")]
    NoFightsLeft,

    /// Transport failure or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered but the body could not be understood.
    #[error("invalid response from fight service: {0}")]
    InvalidResponse(String),
}

impl FightError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FightError::Network(_))
    }
}

impl From<reqwest::Error> for FightError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FightError::InvalidResponse(err.to_string())
        } else {
            FightError::Network(err.to_string())
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Construction-time contract violations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A session needs at least one round
    #[error("total_rounds must be at least 1")]
    ZeroRounds,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(FightError::Network("timeout".into()).is_retryable());
        assert!(!FightError::NoFightsLeft.is_retryable());
        assert!(!FightError::EmptySequence.is_retryable());
        assert!(!FightError::InvalidResponse("x".into()).is_retryable());
    }

    #[test]
    fn fight_error_converts_into_core_error() {
        let err: CoreError = FightError::NoFightsLeft.into();
        assert_eq!(err.to_string(), "Fight error: no fights left");
    }
}

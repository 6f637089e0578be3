//! Error types for cadence
//!
//! Provides a unified error type for sync and reporting operations.

use crate::tracker::TrackerError;
use std::fmt;

/// Result type alias for cadence operations.
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Main error type for cadence operations.
#[derive(Debug)]
pub enum CadenceError {
    /// Configuration error (missing token, unparseable quarters file).
    Config(String),

    /// Database error.
    Database(String),

    /// Remote tracker error that escalated past the retry policy.
    Tracker(TrackerError),

    /// Another process holds the single-instance lock.
    LockContention(String),

    /// Run was cancelled by signal or timeout.
    Cancelled,

    /// Report generation error.
    Report(String),

    /// IO error.
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serde(serde_json::Error),

    /// SQL error.
    Sqlx(sqlx::Error),

    /// Generic error with message.
    Other(String),
}

impl CadenceError {
    /// Process exit code for this error.
    ///
    /// 2 is reserved for lock contention and 130 for cancellation; every
    /// other failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LockContention(_) => 2,
            Self::Cancelled => 130,
            _ => 1,
        }
    }
}

impl fmt::Display for CadenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Database(msg) => write!(f, "Database error: {}", msg),
            Self::Tracker(err) => write!(f, "Tracker error: {}", err),
            Self::LockContention(path) => {
                write!(f, "Another sync instance is running (lock file: {})", path)
            }
            Self::Cancelled => write!(f, "cancelled"),
            Self::Report(msg) => write!(f, "Report error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serde(err) => write!(f, "Serialization error: {}", err),
            Self::Sqlx(err) => write!(f, "SQL error: {}", err),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CadenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tracker(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serde(err) => Some(err),
            Self::Sqlx(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TrackerError> for CadenceError {
    fn from(err: TrackerError) -> Self {
        Self::Tracker(err)
    }
}

impl From<std::io::Error> for CadenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CadenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

impl From<sqlx::Error> for CadenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Sqlx(err)
    }
}

impl From<tooling::ToolingError> for CadenceError {
    fn from(err: tooling::ToolingError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<String> for CadenceError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

//! Error type for the utility crate.

use std::fmt;

/// Result type alias for tooling operations.
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Errors produced by the utility helpers.
#[derive(Debug)]
pub enum ToolingError {
    /// Environment variable present but unusable (bad UTF-8, parse failure).
    Env(String),

    /// Generic error with message.
    General(String),
}

impl fmt::Display for ToolingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(msg) => write!(f, "Environment error: {}", msg),
            Self::General(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ToolingError {}

impl From<String> for ToolingError {
    fn from(msg: String) -> Self {
        Self::General(msg)
    }
}

//! Error types shared across the Skirmish crates.

use thiserror::Error;

/// Top-level error type for loading and running a skirmish.
#[derive(Debug, Error)]
pub enum SkirmishError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Metadata table could not be parsed
    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type alias for Skirmish operations.
pub type SkirmishResult<T> = Result<T, SkirmishError>;

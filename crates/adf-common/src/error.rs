//! Error types for the datafeed

use thiserror::Error;

/// Result type alias for datafeed operations
pub type Result<T> = std::result::Result<T, AdfError>;

/// Main error type for the datafeed
#[derive(Error, Debug)]
pub enum AdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed timestamp: {0:?} (expected YYYY-MM-DD HH:MM:SS)")]
    MalformedTimestamp(String),

    #[error("Term {term:?} has no entry in translation table '{table}'")]
    VocabularyMiss { table: &'static str, term: String },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Envelope protocol violation: {0}")]
    Envelope(&'static str),
}

impl AdfError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a record-level data error
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }
}

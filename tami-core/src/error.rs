//! Error types for the Tami core library.

use thiserror::Error;

/// Top-level error type for all Tami core operations.
#[derive(Error, Debug)]
pub enum TamiError {
    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored timestamp could not be parsed.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw text that failed to parse.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A memory category name that is not one of the known categories.
    #[error("Unknown memory category: {0}")]
    UnknownCategory(String),

    /// Memory content was rejected before it reached the store.
    #[error("Memory rejected: {reason}")]
    InvalidMemory {
        /// Why the content was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, TamiError>;

//! Error types for freshtrack-store.

use std::path::PathBuf;

/// Result type for freshtrack-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in freshtrack-store.
///
/// These stay internal to the persistence layer: the [`Db`](crate::Db)
/// facade collapses every one of them to the neutral shape its contract
/// documents (absent identifier, empty list, zeroed summary).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create the database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Connection could not be established within the retry budget.
    #[error("Connection failed after {attempts} attempts")]
    ConnectionFailed { attempts: u32 },

    /// Invalid timestamp or calendar component.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization error (tags are persisted as JSON).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for parsing caller-supplied values.

use thiserror::Error;

/// Errors that can occur when parsing caller-supplied identifiers or labels.
///
/// The store layer maps these to "not found" / `false` at its boundary;
/// they are never surfaced to HTTP callers directly.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The string is not a valid record identifier.
    #[error("Invalid record id: {0}")]
    InvalidId(String),

    /// The value could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using [`ParseError`].
pub type ParseResult<T> = std::result::Result<T, ParseError>;

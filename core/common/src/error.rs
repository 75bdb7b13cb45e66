//! Common error types for Tidepool.

use thiserror::Error;

/// Top-level error type for Tidepool operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A write carried a stale or missing revision. Recoverable: re-read
    /// the document and retry with the current revision.
    #[error("Conflict on {id}: stored rev is {current_rev}")]
    Conflict { id: String, current_rev: String },

    /// Document or attachment does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying storage engine fault. Fatal to the operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential encryption or decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Remote store operation failed.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

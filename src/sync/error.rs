//! Sync error types.

use thiserror::Error;

/// Errors reported by a remote list store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The referenced list does not exist (or no longer exists).
    #[error("List not found: {0}")]
    NotFound(String),

    /// The request was rejected as malformed.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Transport-level failure: connection refused, timeout, bad response body.
    #[error("Network failure: {0}")]
    Network(String),

    /// The server answered with an unexpected error status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(String),
}

/// Errors surfaced by the sync engine to its caller.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No list is open")]
    NoOpenList,

    #[error("List name cannot be empty")]
    InvalidName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

//! Domain-level error types for the collaborator boundaries.

use thiserror::Error;

/// Errors surfaced by the message persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store rejected or lost the write
    #[error("persistence failed: {0}")]
    Unavailable(String),

    #[error("conversation '{0}' not found")]
    ConversationNotFound(String),
}

/// Errors surfaced by the user directory collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("user '{0}' not found")]
    UserNotFound(String),
}

/// Errors surfaced when pushing an event to a single connection.
///
/// During a broadcast these are isolated per recipient and never fail
/// the multicast as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

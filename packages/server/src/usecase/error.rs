//! UseCase error types.
//!
//! Every variant maps onto the engine-wide taxonomy reported back to the
//! acting connection: `not_found`, `not_authorized`, `persistence_failed`
//! or `validation_failed`. All of these are local, recoverable conditions;
//! none of them ever tears down the broadcast loop.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
}

impl MembershipError {
    pub fn code(&self) -> &'static str {
        "not_found"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    /// Caller is not a member of the conversation room
    #[error("not a member of conversation '{0}'")]
    NotAuthorized(String),

    /// The persistence collaborator failed; no broadcast happened
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl PublishError {
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::ConnectionNotFound(_) => "not_found",
            PublishError::NotAuthorized(_) => "not_authorized",
            PublishError::PersistenceFailed(_) => "persistence_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("not a member of conversation '{0}'")]
    NotAuthorized(String),
}

impl TypingError {
    pub fn code(&self) -> &'static str {
        match self {
            TypingError::ConnectionNotFound(_) => "not_found",
            TypingError::NotAuthorized(_) => "not_authorized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkReadError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("not a member of conversation '{0}'")]
    NotAuthorized(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl MarkReadError {
    pub fn code(&self) -> &'static str {
        match self {
            MarkReadError::ConnectionNotFound(_) => "not_found",
            MarkReadError::NotAuthorized(_) => "not_authorized",
            MarkReadError::PersistenceFailed(_) => "persistence_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceUpdateError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("identity '{0}' is not online")]
    IdentityOffline(String),

    /// Client sent a status outside the updatable set
    #[error("invalid presence status '{0}'")]
    InvalidStatus(String),
}

impl PresenceUpdateError {
    pub fn code(&self) -> &'static str {
        match self {
            PresenceUpdateError::ConnectionNotFound(_) => "not_found",
            PresenceUpdateError::IdentityOffline(_) => "not_found",
            PresenceUpdateError::InvalidStatus(_) => "validation_failed",
        }
    }
}

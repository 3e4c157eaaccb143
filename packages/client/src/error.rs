//! Error types for the client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the identity on the handshake
    #[error("Identity '{0}' was rejected by the server")]
    InvalidIdentity(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Reconciliation fetch of persisted notifications failed
    #[error("Notification fetch failed: {0}")]
    FetchFailed(String),
}

//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::{entity::NotificationKind, MessageKind, PresenceStatus};

/// Presence roster returned by `GET /api/presence`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRosterDto {
    pub users: Vec<PresenceUserDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUserDto {
    pub user_id: String,
    pub status: PresenceStatus,
    pub changed_at: String,
}

/// One message of a conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecordDto {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: String,
    pub read: bool,
}

/// Persisted notification record returned by `GET /api/notifications`.
///
/// `created_at` stays in epoch milliseconds: the client feeds these
/// records back through its normalization layer, which works in millis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecordDto {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub created_at: i64,
    pub read: bool,
}

//! Domain entities.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::value_object::{
    ConnectionId, ConversationId, DisplayName, MessageContent, MessageKind, Timestamp, UserId,
};

/// One live bidirectional connection and the identity bound to it.
///
/// Owned by the connection registry; the joined-room set is mirrored here
/// so that disconnect cleanup can leave every room without scanning the
/// room directory.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub joined_rooms: HashSet<ConversationId>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            display_name,
            joined_rooms: HashSet::new(),
            connected_at,
        }
    }

    pub fn has_joined(&self, conversation_id: &ConversationId) -> bool {
        self.joined_rooms.contains(conversation_id)
    }
}

/// Display metadata of an identity, resolved through the user directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub avatar_ref: Option<String>,
}

/// Attachment metadata carried alongside image/file messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// A message persisted by the message store.
///
/// The engine never authors this shape itself; the store assigns id and
/// timestamp and the pipeline only decides its fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: String,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub kind: MessageKind,
    pub attachment: Option<AttachmentMeta>,
    pub created_at: Timestamp,
    pub read: bool,
}

/// Persisted notification record, fetched by clients independently of
/// the live broadcast path.
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub conversation_id: Option<ConversationId>,
    pub sender_id: Option<UserId>,
    pub created_at: Timestamp,
    pub read: bool,
}

/// Classification of a persisted notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
    General,
}

//! Conversion logic between DTOs and domain entities.

use kakehashi_shared::time::timestamp_to_rfc3339;

use crate::domain::{NotificationRecord, StoredMessage, UserProfile};
use crate::infrastructure::dto::{http, websocket as ws};
use crate::infrastructure::presence::PresenceSnapshot;

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl ws::MessageDto {
    /// Build the fan-out wire shape of a stored message, enriched with
    /// the sender's resolved display metadata
    pub fn from_stored(message: &StoredMessage, sender: &UserProfile) -> Self {
        Self {
            id: message.id.clone(),
            conversation_id: message.conversation_id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            sender_name: sender.display_name.as_str().to_string(),
            avatar_ref: sender.avatar_ref.clone(),
            content: message.content.as_str().to_string(),
            kind: message.kind,
            attachment: message.attachment.clone(),
            created_at: message.created_at.value(),
            read: message.read,
        }
    }
}

impl From<&PresenceSnapshot> for ws::PresenceInfoDto {
    fn from(snapshot: &PresenceSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.as_str().to_string(),
            status: snapshot.status,
            changed_at: snapshot.changed_at.value(),
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<&PresenceSnapshot> for http::PresenceUserDto {
    fn from(snapshot: &PresenceSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.as_str().to_string(),
            status: snapshot.status,
            changed_at: timestamp_to_rfc3339(snapshot.changed_at.value()),
        }
    }
}

impl From<&StoredMessage> for http::MessageRecordDto {
    fn from(message: &StoredMessage) -> Self {
        Self {
            id: message.id.clone(),
            conversation_id: message.conversation_id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            content: message.content.as_str().to_string(),
            kind: message.kind,
            created_at: timestamp_to_rfc3339(message.created_at.value()),
            read: message.read,
        }
    }
}

impl From<&NotificationRecord> for http::NotificationRecordDto {
    fn from(record: &NotificationRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.as_str().to_string(),
            kind: record.kind,
            title: record.title.clone(),
            body: record.body.clone(),
            conversation_id: record
                .conversation_id
                .as_ref()
                .map(|c| c.as_str().to_string()),
            sender_id: record.sender_id.as_ref().map(|u| u.as_str().to_string()),
            created_at: record.created_at.value(),
            read: record.read,
        }
    }
}

//! WebSocket frame DTOs.
//!
//! Inbound frames are one tagged `ClientAction` enum; outbound frames are
//! one struct per event type carrying an explicit `type` tag, so clients
//! can dispatch on `type` without trying every shape.

use serde::{Deserialize, Serialize};

use crate::domain::{AttachmentMeta, MessageKind, PresenceStatus};

/// Tag of an outbound event frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Connected,
    JoinedConversation,
    LeftConversation,
    NewMessage,
    UserTyping,
    MessagesRead,
    UserOnline,
    UserOffline,
    PresenceUpdated,
    Error,
}

/// Inbound actions accepted from an authenticated connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    JoinConversation {
        conversation_id: String,
    },
    LeaveConversation {
        conversation_id: String,
    },
    SendMessage {
        conversation_id: String,
        content: String,
        #[serde(default)]
        kind: MessageKind,
        #[serde(default)]
        attachment: Option<AttachmentMeta>,
    },
    TypingStart {
        conversation_id: String,
    },
    TypingStop {
        conversation_id: String,
    },
    MarkAsRead {
        conversation_id: String,
        #[serde(default)]
        message_ids: Option<Vec<String>>,
    },
    UpdatePresence {
        status: String,
    },
}

/// Presence roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceInfoDto {
    pub user_id: String,
    pub status: PresenceStatus,
    pub changed_at: i64,
}

/// Wire shape of a fanned-out message, enriched with sender metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(default)]
    pub avatar_ref: Option<String>,
    pub content: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub attachment: Option<AttachmentMeta>,
    pub created_at: i64,
    pub read: bool,
}

/// Connection acknowledgement, sent once to the new connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedEvent {
    pub r#type: EventType,
    pub connection_id: String,
    pub user_id: String,
    pub presence: Vec<PresenceInfoDto>,
}

/// Join acknowledgement, sent to the acting connection only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedConversationEvent {
    pub r#type: EventType,
    pub conversation_id: String,
    pub user_id: String,
}

/// Leave acknowledgement, sent to the acting connection only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeftConversationEvent {
    pub r#type: EventType,
    pub conversation_id: String,
    pub user_id: String,
}

/// Message fan-out frame, delivered to every room member including the
/// sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageEvent {
    pub r#type: EventType,
    pub conversation_id: String,
    pub message: MessageDto,
}

/// Typing indicator frame, delivered to room members except the
/// originator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTypingEvent {
    pub r#type: EventType,
    pub conversation_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

/// Read-receipt frame. `message_ids: None` signals "all unread as of
/// now"; receivers recompute unread counts instead of diffing ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReadEvent {
    pub r#type: EventType,
    pub conversation_id: String,
    pub user_id: String,
    #[serde(default)]
    pub message_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOnlineEvent {
    pub r#type: EventType,
    pub user_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOfflineEvent {
    pub r#type: EventType,
    pub user_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdatedEvent {
    pub r#type: EventType,
    pub user_id: String,
    pub status: PresenceStatus,
    pub timestamp: i64,
}

/// Per-action failure report, sent to the acting connection only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub r#type: EventType,
    pub code: String,
    pub detail: String,
}

impl ErrorEvent {
    pub fn new(code: &str, detail: impl Into<String>) -> Self {
        Self {
            r#type: EventType::Error,
            code: code.to_string(),
            detail: detail.into(),
        }
    }
}

//! UseCase: message publish and fan-out.
//!
//! Ordering is load-bearing here:
//!
//! 1. capability check: the caller must be a current member of the room
//! 2. durable store through the persistence collaborator; on failure the
//!    pipeline surfaces the error to the sender and performs no
//!    broadcast, so no participant ever sees a phantom message
//! 3. broadcast of the enriched wire shape to the room, **including**
//!    the sender's own connection (the echo is the sender's delivery
//!    confirmation, unlike typing/presence which exclude the originator)
//!
//! Within one room, broadcast order equals persistence-completion order;
//! the store assigns monotonic timestamps so no reordering buffer is
//! needed at this layer.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{
    AttachmentMeta, ConnectionId, ConversationId, MessageContent, MessageKind, MessageStore,
    NotificationRecord, NotificationStore, StoredMessage, UserDirectory, UserProfile,
    entity::NotificationKind,
};
use crate::infrastructure::dto::websocket::{EventType, MessageDto, NewMessageEvent};
use crate::infrastructure::{ConnectionRegistry, RoomManager};

use super::error::PublishError;

/// Longest message prefix copied into a notification body
const NOTIFICATION_PREVIEW_CHARS: usize = 80;

pub struct PublishMessageUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    store: Arc<dyn MessageStore>,
    directory: Arc<dyn UserDirectory>,
    notifications: Arc<dyn NotificationStore>,
}

impl PublishMessageUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            registry,
            rooms,
            store,
            directory,
            notifications,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: ConversationId,
        content: MessageContent,
        kind: MessageKind,
        attachment: Option<AttachmentMeta>,
    ) -> Result<StoredMessage, PublishError> {
        // 1. capability check
        let connection = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or_else(|| PublishError::ConnectionNotFound(connection_id.as_str().to_string()))?;
        if !self.rooms.is_member(&conversation_id, connection_id).await {
            return Err(PublishError::NotAuthorized(
                conversation_id.as_str().to_string(),
            ));
        }

        // 2. durable store; the only suspension point on the hot path
        //    that touches external I/O
        let message = self
            .store
            .store(
                conversation_id.clone(),
                connection.user_id.clone(),
                content,
                kind,
                attachment,
            )
            .await
            .map_err(|e| PublishError::PersistenceFailed(e.to_string()))?;

        // 3. enrich with sender metadata; directory misses fall back to
        //    the metadata registered on connect
        let sender = match self.directory.resolve(connection.user_id.clone()).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    "Directory lookup for '{}' failed ({}), using registered name",
                    connection.user_id.as_str(),
                    e
                );
                UserProfile {
                    user_id: connection.user_id.clone(),
                    display_name: connection.display_name.clone(),
                    avatar_ref: None,
                }
            }
        };

        let event = NewMessageEvent {
            r#type: EventType::NewMessage,
            conversation_id: conversation_id.as_str().to_string(),
            message: MessageDto::from_stored(&message, &sender),
        };
        match serde_json::to_string(&event) {
            Ok(json) => {
                self.rooms.broadcast(&conversation_id, &json, None).await;
            }
            Err(e) => {
                tracing::warn!("Failed to serialize new_message event: {}", e);
            }
        }

        self.record_notifications(&conversation_id, &message, &sender)
            .await;

        Ok(message)
    }

    /// Append one persisted notification record per member identity
    /// other than the sender. Failures here are logged and never affect
    /// the publish result: the live broadcast already happened.
    async fn record_notifications(
        &self,
        conversation_id: &ConversationId,
        message: &StoredMessage,
        sender: &UserProfile,
    ) {
        let members = self.rooms.members(conversation_id).await;
        let mut notified = HashSet::new();
        for member_connection in members {
            let Some(member) = self.registry.lookup(&member_connection).await else {
                continue;
            };
            if member.user_id == message.sender_id || !notified.insert(member.user_id.clone()) {
                continue;
            }
            let record = NotificationRecord {
                // 通知 id はメッセージ id と同一。live 経路と照合経路の
                // 重複排除がこの一致に依存している。
                id: message.id.clone(),
                user_id: member.user_id,
                kind: NotificationKind::Message,
                title: format!("New message from {}", sender.display_name.as_str()),
                body: Some(preview(message.content.as_str())),
                conversation_id: Some(conversation_id.clone()),
                sender_id: Some(message.sender_id.clone()),
                created_at: message.created_at,
                read: false,
            };
            if let Err(e) = self.notifications.append(record).await {
                tracing::warn!("Failed to append notification record: {}", e);
            }
        }
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= NOTIFICATION_PREVIEW_CHARS {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(NOTIFICATION_PREVIEW_CHARS).collect();
        format!("{truncated}…")
    }
}

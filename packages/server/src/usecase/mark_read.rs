//! UseCase: read-receipt propagation.
//!
//! Flips read flags through the persistence collaborator (never on the
//! reader's own messages) and re-broadcasts `messages_read` to the room,
//! excluding the originator. Omitted `message_ids` means "all unread as
//! of now"; receivers recompute their unread counts instead of diffing
//! specific ids.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConversationId, MessageStore};
use crate::infrastructure::dto::websocket::{EventType, MessagesReadEvent};
use crate::infrastructure::{ConnectionRegistry, RoomManager};

use super::error::MarkReadError;

pub struct MarkReadUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    store: Arc<dyn MessageStore>,
}

impl MarkReadUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            registry,
            rooms,
            store,
        }
    }

    /// Returns the number of messages the store flipped to read.
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: ConversationId,
        message_ids: Option<Vec<String>>,
    ) -> Result<usize, MarkReadError> {
        let connection = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or_else(|| MarkReadError::ConnectionNotFound(connection_id.as_str().to_string()))?;
        if !self.rooms.is_member(&conversation_id, connection_id).await {
            return Err(MarkReadError::NotAuthorized(
                conversation_id.as_str().to_string(),
            ));
        }

        let affected = self
            .store
            .mark_read(
                conversation_id.clone(),
                connection.user_id.clone(),
                message_ids.clone(),
            )
            .await
            .map_err(|e| MarkReadError::PersistenceFailed(e.to_string()))?;

        let event = MessagesReadEvent {
            r#type: EventType::MessagesRead,
            conversation_id: conversation_id.as_str().to_string(),
            user_id: connection.user_id.into_string(),
            message_ids,
        };
        match serde_json::to_string(&event) {
            Ok(json) => {
                self.rooms
                    .broadcast(&conversation_id, &json, Some(connection_id))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Failed to serialize messages_read event: {}", e);
            }
        }

        Ok(affected)
    }
}

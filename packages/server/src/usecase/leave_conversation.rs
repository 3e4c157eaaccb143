//! UseCase: leave a conversation room.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConversationId, EventPusher};
use crate::infrastructure::dto::websocket::{EventType, LeftConversationEvent};
use crate::infrastructure::{ConnectionRegistry, RoomManager};

use super::error::MembershipError;

pub struct LeaveConversationUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    pusher: Arc<dyn EventPusher>,
}

impl LeaveConversationUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        pusher: Arc<dyn EventPusher>,
    ) -> Self {
        Self {
            registry,
            rooms,
            pusher,
        }
    }

    /// Remove the connection from the room and send the
    /// `left_conversation` acknowledgement. Leaving a room the
    /// connection is not in is a no-op; the room is garbage-collected
    /// when its member set becomes empty.
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: ConversationId,
    ) -> Result<(), MembershipError> {
        let connection = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or_else(|| MembershipError::ConnectionNotFound(connection_id.as_str().to_string()))?;

        self.rooms.leave(&conversation_id, connection_id).await;
        self.registry
            .track_leave(connection_id, &conversation_id)
            .await;

        let ack = LeftConversationEvent {
            r#type: EventType::LeftConversation,
            conversation_id: conversation_id.into_string(),
            user_id: connection.user_id.into_string(),
        };
        match serde_json::to_string(&ack) {
            Ok(json) => {
                if let Err(e) = self.pusher.push_to(connection_id, &json).await {
                    tracing::warn!(
                        "Failed to ack leave to connection '{}': {}",
                        connection_id.as_str(),
                        e
                    );
                }
            }
            Err(e) => tracing::warn!("Failed to serialize leave ack: {}", e),
        }
        Ok(())
    }
}

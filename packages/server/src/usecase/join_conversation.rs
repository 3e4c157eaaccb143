//! UseCase: join a conversation room.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConversationId, EventPusher};
use crate::infrastructure::dto::websocket::{EventType, JoinedConversationEvent};
use crate::infrastructure::{ConnectionRegistry, RoomManager};

use super::error::MembershipError;

pub struct JoinConversationUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    pusher: Arc<dyn EventPusher>,
}

impl JoinConversationUseCase {
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

    /// Add the connection to the room (lazily creating it) and send the
    /// `joined_conversation` acknowledgement to the caller. Joining a
    /// room twice is a no-op.
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

        self.rooms.join(&conversation_id, connection_id.clone()).await;
        self.registry
            .track_join(connection_id, conversation_id.clone())
            .await;

        let ack = JoinedConversationEvent {
            r#type: EventType::JoinedConversation,
            conversation_id: conversation_id.into_string(),
            user_id: connection.user_id.into_string(),
        };
        self.push_ack(connection_id, &ack).await;
        Ok(())
    }

    async fn push_ack(&self, connection_id: &ConnectionId, ack: &JoinedConversationEvent) {
        match serde_json::to_string(ack) {
            Ok(json) => {
                if let Err(e) = self.pusher.push_to(connection_id, &json).await {
                    tracing::warn!(
                        "Failed to ack join to connection '{}': {}",
                        connection_id.as_str(),
                        e
                    );
                }
            }
            Err(e) => tracing::warn!("Failed to serialize join ack: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Timestamp, UserId};
    use crate::infrastructure::WebSocketEventPusher;
    use tokio::sync::mpsc;

    fn conv(id: &str) -> ConversationId {
        ConversationId::new(id.to_string()).unwrap()
    }

    fn create_usecase() -> (JoinConversationUseCase, Arc<ConnectionRegistry>, Arc<RoomManager>, Arc<WebSocketEventPusher>)
    {
        let pusher = Arc::new(WebSocketEventPusher::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomManager::new(pusher.clone()));
        let usecase = JoinConversationUseCase::new(registry.clone(), rooms.clone(), pusher.clone());
        (usecase, registry, rooms, pusher)
    }

    async fn register(
        registry: &ConnectionRegistry,
        pusher: &WebSocketEventPusher,
        user: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let conn_id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_connection(conn_id.clone(), tx).await;
        registry
            .register(
                conn_id.clone(),
                UserId::new(user.to_string()).unwrap(),
                DisplayName::new(user.to_string()).unwrap(),
                Timestamp::new(1000),
            )
            .await;
        (conn_id, rx)
    }

    #[tokio::test]
    async fn test_join_adds_member_and_acks_caller() {
        // テスト項目: join で room に追加され、本人に ack が届く
        // given (前提条件):
        let (usecase, registry, rooms, pusher) = create_usecase();
        let (conn_id, mut rx) = register(&registry, &pusher, "alice").await;

        // when (操作):
        usecase.execute(&conn_id, conv("conv-1")).await.unwrap();

        // then (期待する結果):
        assert!(rooms.is_member(&conv("conv-1"), &conn_id).await);
        let connection = registry.lookup(&conn_id).await.unwrap();
        assert!(connection.has_joined(&conv("conv-1")));
        let ack = rx.recv().await.unwrap();
        assert!(ack.contains(r#""type":"joined_conversation""#));
        assert!(ack.contains(r#""conversation_id":"conv-1""#));
    }

    #[tokio::test]
    async fn test_double_join_keeps_single_membership() {
        // テスト項目: 二度 join してもメンバーは 1 件のまま
        // given (前提条件):
        let (usecase, registry, rooms, pusher) = create_usecase();
        let (conn_id, _rx) = register(&registry, &pusher, "alice").await;

        // when (操作):
        usecase.execute(&conn_id, conv("conv-1")).await.unwrap();
        usecase.execute(&conn_id, conv("conv-1")).await.unwrap();

        // then (期待する結果):
        assert_eq!(rooms.members(&conv("conv-1")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_with_unknown_connection_fails() {
        // テスト項目: 未登録接続の join は ConnectionNotFound になる
        // given (前提条件):
        let (usecase, _registry, rooms, _pusher) = create_usecase();
        let ghost = ConnectionId::generate();

        // when (操作):
        let result = usecase.execute(&ghost, conv("conv-1")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MembershipError::ConnectionNotFound(_))));
        assert_eq!(rooms.room_count().await, 0);
    }
}

//! UseCase: typing indicator relay.
//!
//! The coordinator is a stateless relay: it validates room membership,
//! broadcasts `user_typing` to the conversation excluding the
//! originator, and keeps nothing beyond the latest broadcast. The
//! timeout is sender-owned: the originating client sends `typing_stop`
//! when input ceases, and receivers treat a stale `is_typing=true`
//! as stopped after their own display window.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConversationId};
use crate::infrastructure::dto::websocket::{EventType, UserTypingEvent};
use crate::infrastructure::{ConnectionRegistry, RoomManager};

use super::error::TypingError;

pub struct TypingIndicatorUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
}

impl TypingIndicatorUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, rooms: Arc<RoomManager>) -> Self {
        Self { registry, rooms }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: ConversationId,
        is_typing: bool,
    ) -> Result<(), TypingError> {
        let connection = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or_else(|| TypingError::ConnectionNotFound(connection_id.as_str().to_string()))?;
        if !self.rooms.is_member(&conversation_id, connection_id).await {
            return Err(TypingError::NotAuthorized(
                conversation_id.as_str().to_string(),
            ));
        }

        let event = UserTypingEvent {
            r#type: EventType::UserTyping,
            conversation_id: conversation_id.as_str().to_string(),
            user_id: connection.user_id.into_string(),
            is_typing,
        };
        match serde_json::to_string(&event) {
            Ok(json) => {
                self.rooms
                    .broadcast(&conversation_id, &json, Some(connection_id))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Failed to serialize user_typing event: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, EventPusher, Timestamp, UserId};
    use crate::infrastructure::WebSocketEventPusher;
    use tokio::sync::mpsc;

    fn conv(id: &str) -> ConversationId {
        ConversationId::new(id.to_string()).unwrap()
    }

    struct Fixture {
        usecase: TypingIndicatorUseCase,
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        pusher: Arc<WebSocketEventPusher>,
    }

    fn create_fixture() -> Fixture {
        let pusher = Arc::new(WebSocketEventPusher::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomManager::new(pusher.clone()));
        Fixture {
            usecase: TypingIndicatorUseCase::new(registry.clone(), rooms.clone()),
            registry,
            rooms,
            pusher,
        }
    }

    async fn join_member(
        fixture: &Fixture,
        user: &str,
        room: &ConversationId,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let conn_id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        fixture.pusher.register_connection(conn_id.clone(), tx).await;
        fixture
            .registry
            .register(
                conn_id.clone(),
                UserId::new(user.to_string()).unwrap(),
                DisplayName::new(user.to_string()).unwrap(),
                Timestamp::new(1000),
            )
            .await;
        fixture.rooms.join(room, conn_id.clone()).await;
        (conn_id, rx)
    }

    #[tokio::test]
    async fn test_typing_start_excludes_originator() {
        // テスト項目: typing_start は他メンバーにのみ届く（送信者は除外）
        // given (前提条件):
        let fixture = create_fixture();
        let room = conv("conv-1");
        let (alice, mut rx_a) = join_member(&fixture, "alice", &room).await;
        let (_bob, mut rx_b) = join_member(&fixture, "bob", &room).await;

        // when (操作):
        fixture.usecase.execute(&alice, room.clone(), true).await.unwrap();

        // then (期待する結果): bob に 1 配送、alice には 0 配送
        let delivered = rx_b.recv().await.unwrap();
        assert!(delivered.contains(r#""type":"user_typing""#));
        assert!(delivered.contains(r#""is_typing":true"#));
        assert!(delivered.contains(r#""user_id":"alice""#));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_stop_carries_false_flag() {
        // テスト項目: typing_stop は is_typing=false で配送される
        // given (前提条件):
        let fixture = create_fixture();
        let room = conv("conv-1");
        let (alice, _rx_a) = join_member(&fixture, "alice", &room).await;
        let (_bob, mut rx_b) = join_member(&fixture, "bob", &room).await;

        // when (操作):
        fixture.usecase.execute(&alice, room.clone(), false).await.unwrap();

        // then (期待する結果):
        let delivered = rx_b.recv().await.unwrap();
        assert!(delivered.contains(r#""is_typing":false"#));
    }

    #[tokio::test]
    async fn test_typing_outside_joined_room_is_rejected() {
        // テスト項目: 参加していない room への typing は NotAuthorized になる
        // given (前提条件):
        let fixture = create_fixture();
        let room = conv("conv-1");
        let (_bob, mut rx_b) = join_member(&fixture, "bob", &room).await;

        let alice = ConnectionId::generate();
        let (tx, _rx) = mpsc::unbounded_channel();
        fixture.pusher.register_connection(alice.clone(), tx).await;
        fixture
            .registry
            .register(
                alice.clone(),
                UserId::new("alice".to_string()).unwrap(),
                DisplayName::new("alice".to_string()).unwrap(),
                Timestamp::new(1000),
            )
            .await;

        // when (操作):
        let result = fixture.usecase.execute(&alice, room, true).await;

        // then (期待する結果):
        assert_eq!(result, Err(TypingError::NotAuthorized("conv-1".to_string())));
        assert!(rx_b.try_recv().is_err());
    }
}

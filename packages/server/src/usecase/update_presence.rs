//! UseCase: presence status update.

use std::sync::Arc;

use crate::domain::{ConnectionId, PresenceStatus};
use crate::infrastructure::{ConnectionRegistry, PresenceChange, PresenceError, PresenceTracker};

use super::error::PresenceUpdateError;

pub struct UpdatePresenceUseCase {
    registry: Arc<ConnectionRegistry>,
    presence: Arc<PresenceTracker>,
}

impl UpdatePresenceUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, presence: Arc<PresenceTracker>) -> Self {
        Self { registry, presence }
    }

    /// Validate the requested status and apply it through the presence
    /// tracker, which broadcasts `presence_updated` to the presence room
    /// excluding the originating connection.
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        status: &str,
    ) -> Result<PresenceChange, PresenceUpdateError> {
        let connection = self.registry.lookup(connection_id).await.ok_or_else(|| {
            PresenceUpdateError::ConnectionNotFound(connection_id.as_str().to_string())
        })?;
        let status = PresenceStatus::parse_updatable(status)
            .ok_or_else(|| PresenceUpdateError::InvalidStatus(status.to_string()))?;

        self.presence
            .update_status(&connection.user_id, status, Some(connection_id))
            .await
            .map_err(|e| match e {
                PresenceError::IdentityOffline(user) => PresenceUpdateError::IdentityOffline(user),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, EventPusher, Timestamp, UserId};
    use crate::infrastructure::{RoomManager, WebSocketEventPusher};
    use kakehashi_shared::time::FixedClock;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: UpdatePresenceUseCase,
        registry: Arc<ConnectionRegistry>,
        presence: Arc<PresenceTracker>,
        pusher: Arc<WebSocketEventPusher>,
    }

    fn create_fixture() -> Fixture {
        let pusher = Arc::new(WebSocketEventPusher::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomManager::new(pusher.clone()));
        let presence = Arc::new(PresenceTracker::new(
            rooms,
            Arc::new(FixedClock::new(1700000000000)),
        ));
        Fixture {
            usecase: UpdatePresenceUseCase::new(registry.clone(), presence.clone()),
            registry,
            presence,
            pusher,
        }
    }

    async fn connect(fixture: &Fixture, user: &str) -> ConnectionId {
        let conn_id = ConnectionId::generate();
        let (tx, _rx) = mpsc::unbounded_channel();
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
        fixture
            .presence
            .set_online(UserId::new(user.to_string()).unwrap(), conn_id.clone())
            .await;
        conn_id
    }

    #[tokio::test]
    async fn test_update_presence_applies_status() {
        // テスト項目: 有効な status が適用され PresenceChange が返る
        // given (前提条件):
        let fixture = create_fixture();
        let conn = connect(&fixture, "alice").await;

        // when (操作):
        let change = fixture.usecase.execute(&conn, "away").await.unwrap();

        // then (期待する結果):
        assert_eq!(change.status, PresenceStatus::Away);
        assert_eq!(
            fixture
                .presence
                .status_of(&UserId::new("alice".to_string()).unwrap())
                .await,
            PresenceStatus::Away
        );
    }

    #[tokio::test]
    async fn test_update_presence_rejects_unknown_status() {
        // テスト項目: 不正な status 文字列は InvalidStatus になる
        // given (前提条件):
        let fixture = create_fixture();
        let conn = connect(&fixture, "alice").await;

        // when (操作):
        let result = fixture.usecase.execute(&conn, "sleeping").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(PresenceUpdateError::InvalidStatus("sleeping".to_string()))
        );
    }

    #[tokio::test]
    async fn test_update_presence_for_unknown_connection() {
        // テスト項目: 未登録接続からの status 更新は ConnectionNotFound になる
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let result = fixture
            .usecase
            .execute(&ConnectionId::generate(), "busy")
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(PresenceUpdateError::ConnectionNotFound(_))
        ));
    }
}

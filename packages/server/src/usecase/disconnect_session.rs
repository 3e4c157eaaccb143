//! UseCase: session disconnect.
//!
//! Cleanup must complete synchronously before this call returns: a
//! disconnected connection lingering in any room's member set is an
//! invariant violation. The call is idempotent; disconnecting an unknown
//! connection is a no-op.

use std::sync::Arc;

use crate::domain::{ConnectionId, EventPusher};
use crate::infrastructure::{ConnectionRegistry, PresenceTracker, RoomManager};

pub struct DisconnectSessionUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    presence: Arc<PresenceTracker>,
    pusher: Arc<dyn EventPusher>,
}

impl DisconnectSessionUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        presence: Arc<PresenceTracker>,
        pusher: Arc<dyn EventPusher>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
            pusher,
        }
    }

    /// Execute the disconnect sequence.
    ///
    /// Ordering: rooms are left before the presence transition, so the
    /// `user_offline` broadcast can never be delivered to the connection
    /// being torn down.
    pub async fn execute(&self, connection_id: &ConnectionId) {
        let Some(connection) = self.registry.unregister(connection_id).await else {
            tracing::debug!(
                "Disconnect for unknown connection '{}' ignored",
                connection_id.as_str()
            );
            return;
        };

        for room in &connection.joined_rooms {
            self.rooms.leave(room, connection_id).await;
        }

        self.presence
            .set_offline(&connection.user_id, connection_id)
            .await;
        self.pusher.unregister_connection(connection_id).await;

        tracing::info!(
            "Connection '{}' of user '{}' disconnected and cleaned up",
            connection_id.as_str(),
            connection.user_id.as_str()
        );
    }
}

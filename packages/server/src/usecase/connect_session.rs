//! UseCase: session connect.
//!
//! Binds a fresh connection id to the authenticated identity, registers
//! the outbound channel, joins the sentinel presence room and applies the
//! reference-counted online transition.

use std::sync::Arc;

use kakehashi_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, ConversationId, DisplayName, EventPusher, PusherChannel, Timestamp,
    UserDirectory, UserId, UserProfile,
};
use crate::infrastructure::{ConnectionRegistry, PresenceTracker, RoomManager};

pub struct ConnectSessionUseCase {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    presence: Arc<PresenceTracker>,
    directory: Arc<dyn UserDirectory>,
    pusher: Arc<dyn EventPusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomManager>,
        presence: Arc<PresenceTracker>,
        directory: Arc<dyn UserDirectory>,
        pusher: Arc<dyn EventPusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            rooms,
            presence,
            directory,
            pusher,
            clock,
        }
    }

    /// Execute the connect sequence and return the registered connection.
    ///
    /// Ordering: the outbound channel is registered before the presence
    /// room join so the new connection can already receive the broadcasts
    /// triggered by its own online transition's successors.
    pub async fn execute(
        &self,
        user_id: UserId,
        display_name: DisplayName,
        sender: PusherChannel,
    ) -> Connection {
        let connection_id = ConnectionId::generate();
        let display_name = display_name.or_user_id(&user_id);
        let connected_at = Timestamp::new(self.clock.now_millis());

        self.pusher
            .register_connection(connection_id.clone(), sender)
            .await;
        self.registry
            .register(
                connection_id.clone(),
                user_id.clone(),
                display_name.clone(),
                connected_at,
            )
            .await;
        self.directory
            .upsert(UserProfile {
                user_id: user_id.clone(),
                display_name,
                avatar_ref: None,
            })
            .await;

        let presence_room = ConversationId::presence();
        self.rooms.join(&presence_room, connection_id.clone()).await;
        self.registry.track_join(&connection_id, presence_room).await;

        self.presence
            .set_online(user_id, connection_id.clone())
            .await;

        // joined_rooms now contains the presence room
        self.registry
            .lookup(&connection_id)
            .await
            .expect("connection registered in this call")
    }
}

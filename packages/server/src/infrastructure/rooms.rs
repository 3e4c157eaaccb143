//! Room membership manager.
//!
//! Rooms are conversation-scoped broadcast groups, created lazily on the
//! first join and garbage-collected when the member set becomes empty.
//!
//! ## Locking discipline
//!
//! The room map lock is held only for lookup/insert/remove of room
//! handles; each room carries its own lock for member-set access, so
//! unrelated conversations never serialize on one another. Lock order is
//! always map → room; broadcast snapshots the member set and releases
//! every lock before pushing.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConversationId, EventPusher};

type MemberSet = Arc<Mutex<HashSet<ConnectionId>>>;

/// Per-conversation broadcast groups built on top of the event pusher
pub struct RoomManager {
    rooms: Mutex<HashMap<ConversationId, MemberSet>>,
    pusher: Arc<dyn EventPusher>,
}

impl RoomManager {
    pub fn new(pusher: Arc<dyn EventPusher>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            pusher,
        }
    }

    /// Add a connection to a room, creating the room on first join.
    /// Joining a room the connection already belongs to is a no-op.
    pub async fn join(&self, conversation_id: &ConversationId, connection_id: ConnectionId) {
        let room = {
            let mut rooms = self.rooms.lock().await;
            rooms
                .entry(conversation_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(HashSet::new())))
                .clone()
        };
        let mut members = room.lock().await;
        if members.insert(connection_id.clone()) {
            tracing::debug!(
                "Connection '{}' joined room '{}'",
                connection_id.as_str(),
                conversation_id.as_str()
            );
        }
    }

    /// Remove a connection from a room. The room is deleted once its
    /// member set becomes empty; leaving a room the connection is not in
    /// is a no-op.
    pub async fn leave(&self, conversation_id: &ConversationId, connection_id: &ConnectionId) {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(conversation_id) else {
            return;
        };
        let mut members = room.lock().await;
        if members.remove(connection_id) {
            tracing::debug!(
                "Connection '{}' left room '{}'",
                connection_id.as_str(),
                conversation_id.as_str()
            );
        }
        let empty = members.is_empty();
        drop(members);
        if empty {
            rooms.remove(conversation_id);
            tracing::debug!("Room '{}' garbage-collected", conversation_id.as_str());
        }
    }

    /// Snapshot of the current member set of a room
    pub async fn members(&self, conversation_id: &ConversationId) -> Vec<ConnectionId> {
        let Some(room) = self.room_handle(conversation_id).await else {
            return Vec::new();
        };
        let members = room.lock().await;
        members.iter().cloned().collect()
    }

    pub async fn is_member(
        &self,
        conversation_id: &ConversationId,
        connection_id: &ConnectionId,
    ) -> bool {
        let Some(room) = self.room_handle(conversation_id).await else {
            return false;
        };
        let members = room.lock().await;
        members.contains(connection_id)
    }

    /// Deliver a serialized event to every member connection, optionally
    /// excluding the originator. Best-effort multicast: recipients whose
    /// channel has failed are skipped inside the pusher.
    pub async fn broadcast(
        &self,
        conversation_id: &ConversationId,
        payload: &str,
        exclude: Option<&ConnectionId>,
    ) {
        let targets: Vec<ConnectionId> = {
            let Some(room) = self.room_handle(conversation_id).await else {
                return;
            };
            let members = room.lock().await;
            members
                .iter()
                .filter(|id| exclude != Some(*id))
                .cloned()
                .collect()
        };
        if targets.is_empty() {
            return;
        }
        self.pusher.broadcast(targets, payload).await;
    }

    /// Number of currently live rooms
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }

    async fn room_handle(&self, conversation_id: &ConversationId) -> Option<MemberSet> {
        let rooms = self.rooms.lock().await;
        rooms.get(conversation_id).cloned()
    }
}

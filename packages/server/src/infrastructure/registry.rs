//! Connection registry.
//!
//! Tracks every live connection and the identity bound to it. The
//! registry owns the `Connection` entities exclusively; room membership
//! and presence read their views through it but never mutate it.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{Connection, ConnectionId, ConversationId, DisplayName, Timestamp, UserId};

/// Registry of live connections, keyed by connection id
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// Idempotent per connection id: re-registering an id that is still
    /// active replaces identity metadata but preserves its room
    /// memberships.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        connected_at: Timestamp,
    ) -> Connection {
        let mut connections = self.connections.lock().await;
        let entry = connections
            .entry(connection_id.clone())
            .and_modify(|existing| {
                existing.user_id = user_id.clone();
                existing.display_name = display_name.clone();
            })
            .or_insert_with(|| {
                Connection::new(connection_id, user_id.clone(), display_name.clone(), connected_at)
            });
        tracing::debug!("Connection '{}' registered", entry.id.as_str());
        entry.clone()
    }

    /// Remove a connection, returning it (with its joined-room set) so
    /// the caller can run room/presence cleanup. Unknown ids are a no-op.
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(connection_id);
        if removed.is_some() {
            tracing::debug!("Connection '{}' unregistered", connection_id.as_str());
        }
        removed
    }

    pub async fn lookup(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let connections = self.connections.lock().await;
        connections.get(connection_id).cloned()
    }

    /// Record that a connection joined a room
    pub async fn track_join(&self, connection_id: &ConnectionId, conversation_id: ConversationId) {
        let mut connections = self.connections.lock().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.joined_rooms.insert(conversation_id);
        }
    }

    /// Record that a connection left a room
    pub async fn track_leave(
        &self,
        connection_id: &ConnectionId,
        conversation_id: &ConversationId,
    ) {
        let mut connections = self.connections.lock().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.joined_rooms.remove(conversation_id);
        }
    }

    /// Every live connection id bound to the given identity
    pub async fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .filter(|c| &c.user_id == user_id)
            .map(|c| c.id.clone())
            .collect()
    }

    pub async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}

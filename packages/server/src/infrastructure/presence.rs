//! Presence tracker.
//!
//! Reference-counted presence per identity: an identity is online while
//! at least one of its connections is registered, and the offline
//! transition fires only when the last connection goes away. Presence
//! transitions are broadcast to the sentinel presence room that every
//! connection joins on connect.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use kakehashi_shared::time::Clock;

use crate::domain::{ConnectionId, ConversationId, PresenceStatus, Timestamp, UserId};
use crate::infrastructure::dto::websocket::{
    EventType, PresenceUpdatedEvent, UserOfflineEvent, UserOnlineEvent,
};
use crate::infrastructure::rooms::RoomManager;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// `update_status` for an identity with no live connection
    #[error("identity '{0}' is not online")]
    IdentityOffline(String),
}

/// A presence transition that was applied and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChange {
    pub user_id: UserId,
    pub status: PresenceStatus,
    pub changed_at: Timestamp,
}

/// Roster entry for HTTP/connect-ack snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub user_id: UserId,
    pub status: PresenceStatus,
    pub changed_at: Timestamp,
}

struct PresenceEntry {
    connections: HashSet<ConnectionId>,
    status: PresenceStatus,
    changed_at: Timestamp,
}

/// Global presence state, one entry per online identity
pub struct PresenceTracker {
    entries: Mutex<HashMap<UserId, PresenceEntry>>,
    rooms: Arc<RoomManager>,
    clock: Arc<dyn Clock>,
}

impl PresenceTracker {
    pub fn new(rooms: Arc<RoomManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            rooms,
            clock,
        }
    }

    /// Record a new connection for an identity.
    ///
    /// Broadcasts `user_online` to the presence room only when this is
    /// the identity's first live connection; additional connections
    /// coalesce into the existing online state.
    pub async fn set_online(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> Option<PresenceChange> {
        let change = {
            let mut entries = self.entries.lock().await;
            let now = Timestamp::new(self.clock.now_millis());
            match entries.get_mut(&user_id) {
                Some(entry) => {
                    entry.connections.insert(connection_id.clone());
                    None
                }
                None => {
                    let mut connections = HashSet::new();
                    connections.insert(connection_id.clone());
                    entries.insert(
                        user_id.clone(),
                        PresenceEntry {
                            connections,
                            status: PresenceStatus::Online,
                            changed_at: now,
                        },
                    );
                    Some(PresenceChange {
                        user_id: user_id.clone(),
                        status: PresenceStatus::Online,
                        changed_at: now,
                    })
                }
            }
        };

        if let Some(change) = &change {
            let event = UserOnlineEvent {
                r#type: EventType::UserOnline,
                user_id: change.user_id.as_str().to_string(),
                timestamp: change.changed_at.value(),
            };
            self.broadcast_presence_event(&event, Some(&connection_id)).await;
            tracing::info!("User '{}' is now online", change.user_id.as_str());
        }
        change
    }

    /// Drop a connection from an identity's reference count.
    ///
    /// Broadcasts `user_offline` only when the last connection for the
    /// identity is gone; the entry is removed at that point.
    pub async fn set_offline(
        &self,
        user_id: &UserId,
        connection_id: &ConnectionId,
    ) -> Option<PresenceChange> {
        let change = {
            let mut entries = self.entries.lock().await;
            let Some(entry) = entries.get_mut(user_id) else {
                return None;
            };
            entry.connections.remove(connection_id);
            if !entry.connections.is_empty() {
                return None;
            }
            entries.remove(user_id);
            Some(PresenceChange {
                user_id: user_id.clone(),
                status: PresenceStatus::Offline,
                changed_at: Timestamp::new(self.clock.now_millis()),
            })
        };

        if let Some(change) = &change {
            let event = UserOfflineEvent {
                r#type: EventType::UserOffline,
                user_id: change.user_id.as_str().to_string(),
                timestamp: change.changed_at.value(),
            };
            self.broadcast_presence_event(&event, Some(connection_id)).await;
            tracing::info!("User '{}' is now offline", change.user_id.as_str());
        }
        change
    }

    /// Update the status of an online identity and broadcast
    /// `presence_updated`, excluding the originating connection.
    pub async fn update_status(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        originator: Option<&ConnectionId>,
    ) -> Result<PresenceChange, PresenceError> {
        let change = {
            let mut entries = self.entries.lock().await;
            let entry = entries
                .get_mut(user_id)
                .ok_or_else(|| PresenceError::IdentityOffline(user_id.as_str().to_string()))?;
            entry.status = status;
            entry.changed_at = Timestamp::new(self.clock.now_millis());
            PresenceChange {
                user_id: user_id.clone(),
                status,
                changed_at: entry.changed_at,
            }
        };

        let event = PresenceUpdatedEvent {
            r#type: EventType::PresenceUpdated,
            user_id: change.user_id.as_str().to_string(),
            status: change.status,
            timestamp: change.changed_at.value(),
        };
        self.broadcast_presence_event(&event, originator).await;
        Ok(change)
    }

    /// Snapshot of every online identity, sorted by user id
    pub async fn roster(&self) -> Vec<PresenceSnapshot> {
        let entries = self.entries.lock().await;
        let mut roster: Vec<PresenceSnapshot> = entries
            .iter()
            .map(|(user_id, entry)| PresenceSnapshot {
                user_id: user_id.clone(),
                status: entry.status,
                changed_at: entry.changed_at,
            })
            .collect();
        roster.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        roster
    }

    pub async fn status_of(&self, user_id: &UserId) -> PresenceStatus {
        let entries = self.entries.lock().await;
        entries
            .get(user_id)
            .map(|e| e.status)
            .unwrap_or(PresenceStatus::Offline)
    }

    async fn broadcast_presence_event<E: serde::Serialize>(
        &self,
        event: &E,
        exclude: Option<&ConnectionId>,
    ) {
        match serde_json::to_string(event) {
            Ok(json) => {
                self.rooms
                    .broadcast(&ConversationId::presence(), &json, exclude)
                    .await;
            }
            Err(e) => {
                tracing::warn!("Failed to serialize presence event: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventPusher;
    use crate::infrastructure::pusher::WebSocketEventPusher;
    use kakehashi_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn create_tracker() -> (PresenceTracker, Arc<RoomManager>, Arc<WebSocketEventPusher>) {
        let pusher = Arc::new(WebSocketEventPusher::new());
        let rooms = Arc::new(RoomManager::new(pusher.clone()));
        let tracker = PresenceTracker::new(rooms.clone(), Arc::new(FixedClock::new(1700000000000)));
        (tracker, rooms, pusher)
    }

    #[tokio::test]
    async fn test_first_connection_transitions_to_online() {
        // テスト項目: identity の最初の接続で online 遷移が起きる
        // given (前提条件):
        let (tracker, _rooms, _pusher) = create_tracker();
        let conn = ConnectionId::generate();

        // when (操作):
        let change = tracker.set_online(user("alice"), conn).await;

        // then (期待する結果):
        let change = change.unwrap();
        assert_eq!(change.status, PresenceStatus::Online);
        assert_eq!(tracker.status_of(&user("alice")).await, PresenceStatus::Online);
    }

    #[tokio::test]
    async fn test_reference_counted_presence() {
        // テスト項目: 2 接続のうち 1 接続切断では offline にならず、最後の切断で offline になる
        // given (前提条件):
        let (tracker, _rooms, _pusher) = create_tracker();
        let c1 = ConnectionId::generate();
        let c2 = ConnectionId::generate();
        tracker.set_online(user("alice"), c1.clone()).await;
        let second = tracker.set_online(user("alice"), c2.clone()).await;
        assert!(second.is_none()); // 2 接続目では遷移イベントなし

        // when (操作): 1 接続目を切断
        let first_offline = tracker.set_offline(&user("alice"), &c1).await;

        // then (期待する結果): まだ online
        assert!(first_offline.is_none());
        assert_eq!(tracker.status_of(&user("alice")).await, PresenceStatus::Online);

        // when (操作): 最後の接続を切断
        let last_offline = tracker.set_offline(&user("alice"), &c2).await;

        // then (期待する結果): offline 遷移が 1 回だけ起きる
        assert_eq!(last_offline.unwrap().status, PresenceStatus::Offline);
        assert_eq!(tracker.status_of(&user("alice")).await, PresenceStatus::Offline);
    }

    #[tokio::test]
    async fn test_update_status_requires_online_identity() {
        // テスト項目: オフラインの identity の status 更新は IdentityOffline エラーになる
        // given (前提条件):
        let (tracker, _rooms, _pusher) = create_tracker();

        // when (操作):
        let result = tracker
            .update_status(&user("ghost"), PresenceStatus::Away, None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(PresenceError::IdentityOffline("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_update_status_broadcasts_to_presence_room() {
        // テスト項目: status 更新が presence room の他メンバーへ配送される
        // given (前提条件):
        let (tracker, rooms, pusher) = create_tracker();
        let alice_conn = ConnectionId::generate();
        let bob_conn = ConnectionId::generate();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        pusher.register_connection(alice_conn.clone(), tx_a).await;
        pusher.register_connection(bob_conn.clone(), tx_b).await;
        rooms.join(&ConversationId::presence(), alice_conn.clone()).await;
        rooms.join(&ConversationId::presence(), bob_conn.clone()).await;
        tracker.set_online(user("alice"), alice_conn.clone()).await;
        tracker.set_online(user("bob"), bob_conn.clone()).await;
        // set_online 分のイベントを読み捨てる
        while rx_b.try_recv().is_ok() {}
        while rx_a.try_recv().is_ok() {}

        // when (操作): alice が busy に変更
        tracker
            .update_status(&user("alice"), PresenceStatus::Busy, Some(&alice_conn))
            .await
            .unwrap();

        // then (期待する結果): bob には届き、alice 自身には届かない
        let received = rx_b.recv().await.unwrap();
        assert!(received.contains(r#""type":"presence_updated""#));
        assert!(received.contains(r#""status":"busy""#));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_roster_is_sorted_by_user_id() {
        // テスト項目: roster が user id でソートされて返される
        // given (前提条件):
        let (tracker, _rooms, _pusher) = create_tracker();
        tracker.set_online(user("charlie"), ConnectionId::generate()).await;
        tracker.set_online(user("alice"), ConnectionId::generate()).await;
        tracker.set_online(user("bob"), ConnectionId::generate()).await;

        // when (操作):
        let roster = tracker.roster().await;

        // then (期待する結果):
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].user_id.as_str(), "alice");
        assert_eq!(roster[1].user_id.as_str(), "bob");
        assert_eq!(roster[2].user_id.as_str(), "charlie");
    }
}

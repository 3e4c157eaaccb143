//! WebSocket implementation of the event pusher.
//!
//! ## Responsibilities
//!
//! - Manage the per-connection `UnboundedSender` channels
//! - Push serialized events to connections (`push_to`, `broadcast`)
//!
//! The WebSocket itself is created in the UI layer
//! (`src/ui/handler/websocket.rs`); this implementation only receives the
//! sender half of each connection's channel and uses it for delivery,
//! keeping connection acceptance and event delivery separate.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, EventPusher, PushError, PusherChannel};

/// Event pusher backed by per-connection unbounded channels
#[derive(Default)]
pub struct WebSocketEventPusher {
    /// Sender channel of each live connection, keyed by connection id
    channels: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketEventPusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventPusher for WebSocketEventPusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut channels = self.channels.lock().await;
        channels.insert(connection_id.clone(), sender);
        tracing::debug!("Connection '{}' registered to pusher", connection_id.as_str());
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        channels.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from pusher",
            connection_id.as_str()
        );
    }

    async fn push_to(&self, connection_id: &ConnectionId, payload: &str) -> Result<(), PushError> {
        let channels = self.channels.lock().await;
        if let Some(sender) = channels.get(connection_id) {
            sender
                .send(payload.to_string())
                .map_err(|e| PushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(PushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, payload: &str) {
        let channels = self.channels.lock().await;
        for target in targets {
            match channels.get(&target) {
                Some(sender) => {
                    // 個別の送信失敗はブロードキャスト全体を失敗させない
                    if let Err(e) = sender.send(payload.to_string()) {
                        tracing::warn!(
                            "Failed to push event to connection '{}': {}",
                            target.as_str(),
                            e
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target.as_str()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続にイベントを送信できる
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        pusher.register_connection(conn.clone(), tx).await;

        // when (操作):
        let result = pusher.push_to(&conn, "hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_unknown_connection() {
        // テスト項目: 未登録の接続への送信は ConnectionNotFound エラーを返す
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();

        // when (操作):
        let result = pusher.push_to(&ConnectionId::generate(), "hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::ConnectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure_is_tolerated() {
        // テスト項目: 一部の接続チャンネルが閉じていても他の配送は成功する
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let alive = ConnectionId::generate();
        let dead = ConnectionId::generate();
        let (tx_alive, mut rx_alive) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        pusher.register_connection(alive.clone(), tx_alive).await;
        pusher.register_connection(dead.clone(), tx_dead).await;
        drop(rx_dead);

        // when (操作):
        pusher.broadcast(vec![dead, alive], "event").await;

        // then (期待する結果):
        assert_eq!(rx_alive.recv().await, Some("event".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_removes_channel() {
        // テスト項目: 登録解除後の接続には送信できない
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::generate();
        pusher.register_connection(conn.clone(), tx).await;

        // when (操作):
        pusher.unregister_connection(&conn).await;
        let result = pusher.push_to(&conn, "late").await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::ConnectionNotFound(_))));
    }
}

//! Reconciliation fetch of persisted notification records.
//!
//! Events can be missed while the socket is down; on (re)connect the
//! client fetches the persisted records and replays them through the
//! same normalization path as live events. The queue's idempotent
//! insert makes the replay safe.

use serde_json::{Value, json};

use crate::error::ClientError;

/// HTTP client for the server's notification storage API
pub struct NotificationFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl NotificationFetcher {
    /// # Arguments
    ///
    /// * `base_url` - HTTP base of the server (e.g., "http://127.0.0.1:8080")
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the persisted records for one identity, mapped onto the
    /// live-event raw shapes ready for `normalize`.
    pub async fn fetch_raw_events(&self, user_id: &str) -> Result<Vec<Value>, ClientError> {
        let url = format!("{}/api/notifications?user_id={}", self.base_url, user_id);
        let records: Vec<Value> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;

        Ok(records.into_iter().map(record_to_raw_event).collect())
    }

    /// Mark one persisted record as read (fired on local dismiss)
    pub async fn mark_read(&self, notification_id: &str) -> Result<(), ClientError> {
        let url = format!(
            "{}/api/notifications/{}/read",
            self.base_url, notification_id
        );
        self.client
            .post(&url)
            .send()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        Ok(())
    }
}

/// Map one persisted notification record onto the raw shape of the
/// corresponding live event, so a single normalization path handles
/// both origins.
pub fn record_to_raw_event(record: Value) -> Value {
    match record.get("kind").and_then(Value::as_str) {
        Some("message") => json!({
            "type": "new_message",
            "conversation_id": record.get("conversation_id").cloned().unwrap_or(Value::Null),
            "timestamp": record.get("created_at").cloned().unwrap_or(Value::Null),
            "message": {
                "id": record.get("id").cloned().unwrap_or(Value::Null),
                "sender_id": record.get("sender_id").cloned().unwrap_or(Value::Null),
                "content": record.get("body").cloned().unwrap_or(Value::Null),
                "created_at": record.get("created_at").cloned().unwrap_or(Value::Null),
            }
        }),
        _ => json!({
            "type": "notification",
            "id": record.get("id").cloned().unwrap_or(Value::Null),
            "title": record.get("title").cloned().unwrap_or(Value::Null),
            "content": record.get("body").cloned().unwrap_or(Value::Null),
            "timestamp": record.get("created_at").cloned().unwrap_or(Value::Null),
            "data": {},
        }),
    }
}

/// Derive the HTTP base URL from the WebSocket endpoint URL
pub fn http_base_from_ws_url(ws_url: &str) -> String {
    let base = ws_url
        .replacen("wss://", "https://", 1)
        .replacen("ws://", "http://", 1);
    match base.find("://").map(|i| i + 3) {
        Some(authority_start) => match base[authority_start..].find('/') {
            Some(path_start) => base[..authority_start + path_start].to_string(),
            None => base,
        },
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{CanonicalEvent, normalize};
    use kakehashi_shared::time::FixedClock;

    #[test]
    fn test_message_record_maps_to_new_message_raw_shape() {
        // テスト項目: message 種別のレコードが new_message 形に写像される
        // given (前提条件):
        let record = json!({
            "id": "m1",
            "user_id": "bob",
            "kind": "message",
            "title": "New message from alice",
            "body": "hi",
            "conversation_id": "conv-1",
            "sender_id": "alice",
            "created_at": 1690000000000i64,
            "read": false,
        });

        // when (操作): 写像して正規化まで通す
        let raw = record_to_raw_event(record);
        let event = normalize(&raw, "bob", &FixedClock::new(0)).unwrap().unwrap();

        // then (期待する結果): live 経路と同じ id の MessageNotification になる
        match event {
            CanonicalEvent::MessageNotification {
                id,
                conversation_id,
                sender_id,
                preview,
                ..
            } => {
                assert_eq!(id, "m1");
                assert_eq!(conversation_id, "conv-1");
                assert_eq!(sender_id, "alice");
                assert_eq!(preview.as_deref(), Some("hi"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_general_record_maps_to_notification_raw_shape() {
        // テスト項目: general 種別のレコードが notification 形に写像される
        // given (前提条件):
        let record = json!({
            "id": "n1",
            "user_id": "bob",
            "kind": "general",
            "title": "Server maintenance",
            "body": "tonight",
            "created_at": 1690000000000i64,
            "read": false,
        });

        // when (操作):
        let raw = record_to_raw_event(record);
        let event = normalize(&raw, "bob", &FixedClock::new(0)).unwrap().unwrap();

        // then (期待する結果):
        match event {
            CanonicalEvent::GeneralNotification { id, title, content, .. } => {
                assert_eq!(id, "n1");
                assert_eq!(title, "Server maintenance");
                assert_eq!(content.as_deref(), Some("tonight"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_http_base_from_ws_url() {
        // テスト項目: WebSocket URL から HTTP ベース URL が導出される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(
            http_base_from_ws_url("ws://127.0.0.1:8080/ws"),
            "http://127.0.0.1:8080"
        );
        assert_eq!(
            http_base_from_ws_url("wss://chat.example.com/ws"),
            "https://chat.example.com"
        );
        assert_eq!(
            http_base_from_ws_url("ws://localhost:9000"),
            "http://localhost:9000"
        );
    }
}

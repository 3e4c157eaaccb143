//! In-memory notification record storage.
//!
//! Fed by the publish pipeline and fetched by clients over HTTP as the
//! reconciliation path for events missed on the live socket.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NotificationRecord, NotificationStore, StoreError, UserId};

/// In-memory implementation of the notification storage collaborator
#[derive(Default)]
pub struct InMemoryNotificationStore {
    records: Mutex<HashMap<UserId, Vec<NotificationRecord>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, record: NotificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records.entry(record.user_id.clone()).or_default().push(record);
        Ok(())
    }

    async fn for_user(&self, user_id: UserId) -> Vec<NotificationRecord> {
        let records = self.records.lock().await;
        records.get(&user_id).cloned().unwrap_or_default()
    }

    async fn mark_read(&self, notification_id: &str) {
        let mut records = self.records.lock().await;
        for user_records in records.values_mut() {
            for record in user_records.iter_mut() {
                if record.id == notification_id {
                    record.read = true;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{entity::NotificationKind, Timestamp};

    fn record(id: &str, user: &str) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            user_id: UserId::new(user.to_string()).unwrap(),
            kind: NotificationKind::Message,
            title: "New message".to_string(),
            body: Some("hi".to_string()),
            conversation_id: None,
            sender_id: None,
            created_at: Timestamp::new(1000),
            read: false,
        }
    }

    #[tokio::test]
    async fn test_append_and_fetch_per_user() {
        // テスト項目: append したレコードが対象 identity のみに返される
        // given (前提条件):
        let store = InMemoryNotificationStore::new();
        store.append(record("n1", "alice")).await.unwrap();
        store.append(record("n2", "bob")).await.unwrap();

        // when (操作):
        let alice_records = store.for_user(UserId::new("alice".to_string()).unwrap()).await;

        // then (期待する結果):
        assert_eq!(alice_records.len(), 1);
        assert_eq!(alice_records[0].id, "n1");
    }

    #[tokio::test]
    async fn test_mark_read_flips_single_record() {
        // テスト項目: mark_read が指定 id のレコードだけ既読化する
        // given (前提条件):
        let store = InMemoryNotificationStore::new();
        store.append(record("n1", "alice")).await.unwrap();
        store.append(record("n2", "alice")).await.unwrap();

        // when (操作):
        store.mark_read("n1").await;

        // then (期待する結果):
        let records = store.for_user(UserId::new("alice".to_string()).unwrap()).await;
        assert!(records.iter().find(|r| r.id == "n1").unwrap().read);
        assert!(!records.iter().find(|r| r.id == "n2").unwrap().read);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id_is_noop() {
        // テスト項目: 未知の id の mark_read は no-op になる
        // given (前提条件):
        let store = InMemoryNotificationStore::new();
        store.append(record("n1", "alice")).await.unwrap();

        // when (操作):
        store.mark_read("ghost").await;

        // then (期待する結果):
        let records = store.for_user(UserId::new("alice".to_string()).unwrap()).await;
        assert!(!records[0].read);
    }
}

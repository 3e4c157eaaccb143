//! In-memory message store.
//!
//! Vec-backed per conversation. Assigned timestamps are monotonic within
//! one conversation, which is what gives `publish` its per-room ordering
//! guarantee: fan-out replays completions in persistence order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kakehashi_shared::time::Clock;

use crate::domain::{
    AttachmentMeta, ConversationId, MessageContent, MessageKind, MessageStore, StoredMessage,
    StoreError, Timestamp, UserId,
};

struct ConversationLog {
    messages: Vec<StoredMessage>,
    last_timestamp: i64,
}

/// In-memory implementation of the message persistence collaborator
pub struct InMemoryMessageStore {
    conversations: Mutex<HashMap<ConversationId, ConversationLog>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn store(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: MessageContent,
        kind: MessageKind,
        attachment: Option<AttachmentMeta>,
    ) -> Result<StoredMessage, StoreError> {
        let mut conversations = self.conversations.lock().await;
        let log = conversations
            .entry(conversation_id.clone())
            .or_insert_with(|| ConversationLog {
                messages: Vec::new(),
                last_timestamp: 0,
            });

        // Clamp to the last assigned timestamp so ordering within one
        // conversation never goes backwards.
        let now = self.clock.now_millis().max(log.last_timestamp);
        log.last_timestamp = now;

        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id,
            sender_id,
            content,
            kind,
            attachment,
            created_at: Timestamp::new(now),
            read: false,
        };
        log.messages.push(message.clone());
        Ok(message)
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        message_ids: Option<Vec<String>>,
    ) -> Result<usize, StoreError> {
        let mut conversations = self.conversations.lock().await;
        let Some(log) = conversations.get_mut(&conversation_id) else {
            return Ok(0);
        };

        let mut affected = 0;
        for message in log.messages.iter_mut() {
            // 自分のメッセージに既読を付けることはできない
            if message.read || message.sender_id == reader_id {
                continue;
            }
            if let Some(ids) = &message_ids
                && !ids.contains(&message.id)
            {
                continue;
            }
            message.read = true;
            affected += 1;
        }
        Ok(affected)
    }

    async fn history(&self, conversation_id: ConversationId) -> Vec<StoredMessage> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(&conversation_id)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }
}

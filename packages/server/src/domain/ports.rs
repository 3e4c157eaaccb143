//! Port traits required by the coordination engine.
//!
//! The engine owns connections, rooms and presence; everything durable
//! (messages, user metadata, notification records) and the outbound
//! channel itself are collaborators behind these traits. UseCases depend
//! on the traits only, never on the concrete implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    entity::{AttachmentMeta, NotificationRecord, StoredMessage, UserProfile},
    error::{DirectoryError, PushError, StoreError},
    value_object::{ConnectionId, ConversationId, MessageContent, MessageKind, UserId},
};

/// Channel used to push serialized events to one connection
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Outbound event channel registry.
///
/// `broadcast` is best-effort multicast: a recipient whose channel has
/// failed is skipped with a warning and never fails the call.
#[async_trait]
pub trait EventPusher: Send + Sync {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_connection(&self, connection_id: &ConnectionId);

    async fn push_to(&self, connection_id: &ConnectionId, payload: &str)
    -> Result<(), PushError>;

    async fn broadcast(&self, targets: Vec<ConnectionId>, payload: &str);
}

/// Message persistence collaborator (external system boundary)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Durably store a new message. The store assigns id and timestamp;
    /// ids are monotonic within one conversation.
    async fn store(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: MessageContent,
        kind: MessageKind,
        attachment: Option<AttachmentMeta>,
    ) -> Result<StoredMessage, StoreError>;

    /// Flip the read flag on messages in `conversation_id` not authored
    /// by `reader_id`. `message_ids: None` means every unread message as
    /// of now. Returns the number of messages affected.
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader_id: UserId,
        message_ids: Option<Vec<String>>,
    ) -> Result<usize, StoreError>;

    /// Message history of one conversation, oldest first
    async fn history(&self, conversation_id: ConversationId) -> Vec<StoredMessage>;
}

/// User directory collaborator (external system boundary)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, user_id: UserId) -> Result<UserProfile, DirectoryError>;

    /// Record the metadata observed on connect so later broadcasts can be
    /// enriched with it
    async fn upsert(&self, profile: UserProfile);
}

/// Persisted notification storage collaborator (external system boundary)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, record: NotificationRecord) -> Result<(), StoreError>;

    async fn for_user(&self, user_id: UserId) -> Vec<NotificationRecord>;

    /// Mark one record as read; no-op if unknown
    async fn mark_read(&self, notification_id: &str);
}

//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::{EventPusher, MessageStore, NotificationStore};
use crate::infrastructure::PresenceTracker;
use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, JoinConversationUseCase,
    LeaveConversationUseCase, MarkReadUseCase, PublishMessageUseCase, TypingIndicatorUseCase,
    UpdatePresenceUseCase,
};

/// Shared application state
pub struct AppState {
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    pub join_conversation_usecase: Arc<JoinConversationUseCase>,
    pub leave_conversation_usecase: Arc<LeaveConversationUseCase>,
    pub publish_message_usecase: Arc<PublishMessageUseCase>,
    pub mark_read_usecase: Arc<MarkReadUseCase>,
    pub typing_usecase: Arc<TypingIndicatorUseCase>,
    pub update_presence_usecase: Arc<UpdatePresenceUseCase>,
    /// Read-side components for HTTP handlers and the connect ack
    pub presence: Arc<PresenceTracker>,
    pub message_store: Arc<dyn MessageStore>,
    pub notification_store: Arc<dyn NotificationStore>,
    pub pusher: Arc<dyn EventPusher>,
}

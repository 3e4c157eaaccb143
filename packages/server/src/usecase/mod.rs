//! UseCase layer: one orchestration per inbound action.

mod connect_session;
mod disconnect_session;
pub mod error;
mod join_conversation;
mod leave_conversation;
mod mark_read;
mod publish_message;
mod typing;
mod update_presence;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{MarkReadError, MembershipError, PresenceUpdateError, PublishError, TypingError};
pub use join_conversation::JoinConversationUseCase;
pub use leave_conversation::LeaveConversationUseCase;
pub use mark_read::MarkReadUseCase;
pub use publish_message::PublishMessageUseCase;
pub use typing::TypingIndicatorUseCase;
pub use update_presence::UpdatePresenceUseCase;

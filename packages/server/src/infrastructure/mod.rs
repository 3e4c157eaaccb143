//! Infrastructure layer: engine state components, collaborator
//! implementations and wire DTOs.

pub mod dto;
pub mod presence;
pub mod pusher;
pub mod registry;
pub mod rooms;
pub mod store;

pub use presence::{PresenceChange, PresenceError, PresenceSnapshot, PresenceTracker};
pub use pusher::WebSocketEventPusher;
pub use registry::ConnectionRegistry;
pub use rooms::RoomManager;
pub use store::{InMemoryMessageStore, InMemoryNotificationStore, InMemoryUserDirectory};

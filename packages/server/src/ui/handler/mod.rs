//! Request handlers.

mod http;
mod websocket;

pub use http::{
    get_conversation_messages, get_notifications, get_presence, health_check,
    mark_notification_read,
};
pub use websocket::websocket_handler;

//! Value objects for the coordination engine.
//!
//! Identifiers arriving from the outside (query parameters, WebSocket
//! frames) are validated once at the boundary and carried as these types
//! everywhere else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for value object construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
}

/// Room id reserved for the global presence broadcast group
pub const PRESENCE_ROOM: &str = "presence";

/// Identifier of one live connection.
///
/// Generated server-side on connect; one identity may hold several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("connection id"));
        }
        Ok(Self(value))
    }

    /// Generate a fresh connection id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Identifier of an authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("user id"));
        }
        if value.chars().count() > 64 {
            return Err(ValueError::TooLong("user id", 64));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of a conversation-scoped broadcast room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("conversation id"));
        }
        if value.chars().count() > 128 {
            return Err(ValueError::TooLong("conversation id", 128));
        }
        Ok(Self(value))
    }

    /// The sentinel room every connection joins for presence events
    pub fn presence() -> Self {
        Self(PRESENCE_ROOM.to_string())
    }

    pub fn is_presence(&self) -> bool {
        self.0 == PRESENCE_ROOM
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display name attached to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.chars().count() > 80 {
            return Err(ValueError::TooLong("display name", 80));
        }
        Ok(Self(value))
    }

    /// Fall back to the user id when no display name was provided
    pub fn or_user_id(self, user_id: &UserId) -> Self {
        if self.0.is_empty() {
            Self(user_id.as_str().to_string())
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("message content"));
        }
        if value.chars().count() > 4000 {
            return Err(ValueError::TooLong("message content", 4000));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Message payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

/// Presence status of an identity.
///
/// `Offline` is derived from the live connection count and never set
/// through `update_presence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    Busy,
    DoNotDisturb,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Away => "away",
            PresenceStatus::Busy => "busy",
            PresenceStatus::DoNotDisturb => "do_not_disturb",
            PresenceStatus::Offline => "offline",
        }
    }

    /// Parse a status sent by a client. `offline` is rejected: it is
    /// only reachable by closing the last connection.
    pub fn parse_updatable(value: &str) -> Option<Self> {
        match value {
            "online" => Some(PresenceStatus::Online),
            "away" => Some(PresenceStatus::Away),
            "busy" => Some(PresenceStatus::Busy),
            "do_not_disturb" => Some(PresenceStatus::DoNotDisturb),
            _ => None,
        }
    }
}

/// Unix timestamp in UTC milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

//! Conversation fan-out and presence coordination engine.
//!
//! This library maintains live WebSocket connections per authenticated
//! identity, groups them into conversation-scoped broadcast rooms, and
//! coordinates presence transitions, typing indicators, message fan-out
//! and read receipts.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

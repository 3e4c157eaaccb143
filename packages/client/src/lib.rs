//! CLI client for the kakehashi conversation engine.
//!
//! Connects to the server over WebSocket, renders live conversation and
//! presence events, and maintains a deduplicated, bounded notification
//! queue fed by both the live socket and the persisted-notification
//! reconciliation fetch.

pub mod domain;
pub mod error;
pub mod fetch;
pub mod formatter;
pub mod notify;
mod runner;
mod session;
mod ui;

pub use runner::run_client;

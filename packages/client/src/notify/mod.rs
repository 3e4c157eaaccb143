//! Notification layer: payload normalization and the render queue.
//!
//! Both the live socket path and the persisted-notification
//! reconciliation fetch flow through `normalize` into one canonical
//! shape, so the queue and the rendering code never see origin-specific
//! payloads.

pub mod normalize;
pub mod queue;

pub use normalize::{CanonicalEvent, DropReason, normalize, normalize_batch};
pub use queue::{NotificationQueue, QueueEntry};

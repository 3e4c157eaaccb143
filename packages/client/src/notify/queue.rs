//! Bounded, deduplicated notification queue.
//!
//! Entries are idempotent by event id: the same logical event arriving
//! through the live socket and again through the persisted-notification
//! reconciliation fetch is stored once. Each entry expires a fixed delay
//! after enqueue; expiry is applied lazily on every read and mutation,
//! so no background timer is required.

use std::sync::Arc;

use kakehashi_shared::time::Clock;

use super::normalize::CanonicalEvent;

/// Default number of retained entries
const DEFAULT_CAPACITY: usize = 32;

/// Default toast lifetime
const DEFAULT_TTL_MILLIS: i64 = 5_000;

/// One queued notification with its render lifecycle deadline
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub event: CanonicalEvent,
    pub enqueued_at: i64,
    pub expires_at: i64,
}

/// Ordered render queue consumed by the UI layer
pub struct NotificationQueue {
    entries: Vec<QueueEntry>,
    capacity: usize,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl NotificationQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, DEFAULT_CAPACITY, DEFAULT_TTL_MILLIS)
    }

    pub fn with_config(clock: Arc<dyn Clock>, capacity: usize, ttl_millis: i64) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            ttl_millis,
            clock,
        }
    }

    /// Append an event unless an entry with the same id already exists.
    /// Returns whether the event was actually inserted. The oldest entry
    /// is evicted when the queue is full.
    pub fn enqueue(&mut self, event: CanonicalEvent) -> bool {
        self.sweep();
        if self.entries.iter().any(|e| e.event.id() == event.id()) {
            tracing::debug!("Duplicate notification '{}' ignored", event.id());
            return false;
        }
        let now = self.clock.now_millis();
        self.entries.push(QueueEntry {
            event,
            enqueued_at: now,
            expires_at: now + self.ttl_millis,
        });
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        true
    }

    /// Remove one entry immediately. Returns whether it existed.
    pub fn dismiss(&mut self, entry_id: &str) -> bool {
        self.sweep();
        let before = self.entries.len();
        self.entries.retain(|e| e.event.id() != entry_id);
        self.entries.len() < before
    }

    /// Ordered snapshot for the rendering layer, oldest first
    pub fn snapshot(&mut self) -> Vec<QueueEntry> {
        self.sweep();
        self.entries.clone()
    }

    pub fn len(&mut self) -> usize {
        self.sweep();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn sweep(&mut self) {
        let now = self.clock.now_millis();
        self.entries.retain(|e| e.expires_at > now);
    }
}

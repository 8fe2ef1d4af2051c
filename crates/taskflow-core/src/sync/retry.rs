//! Buffer of remote writes awaiting redelivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::models::CollectionKey;
use crate::util::unix_millis_now;

/// A write that failed to reach the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEntry {
    pub collection: CollectionKey,
    pub data: Value,
    /// Version stamped on the failed attempt
    pub version: i64,
    /// Unix ms of the first failed attempt
    pub enqueued_at: i64,
}

impl RetryEntry {
    pub fn new(collection: CollectionKey, data: Value, version: i64) -> Self {
        Self {
            collection,
            data,
            version,
            enqueued_at: unix_millis_now(),
        }
    }

    /// Whether a write stamped after this one exists for the same collection.
    #[must_use]
    pub const fn is_superseded_by(&self, current_version: i64) -> bool {
        self.version < current_version
    }
}

/// Ordered, in-memory, at-least-once retry buffer.
///
/// The queue itself never talks to the network; the sync engine drains it and
/// owns the drain timer. Entries are not deduplicated here; the engine skips
/// superseded ones when draining.
#[derive(Debug, Default)]
pub struct RetryQueue {
    entries: Mutex<Vec<RetryEntry>>,
    drain_scheduled: AtomicBool,
}

impl RetryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RetryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Append an entry to the tail.
    ///
    /// Returns `true` when no drain was scheduled yet; the caller is then
    /// responsible for scheduling one.
    pub fn enqueue(&self, entry: RetryEntry) -> bool {
        self.lock().push(entry);
        !self.drain_scheduled.swap(true, Ordering::SeqCst)
    }

    /// Take every queued entry, leaving the queue empty.
    pub fn take_all(&self) -> Vec<RetryEntry> {
        std::mem::take(&mut *self.lock())
    }

    /// Mark the scheduled drain as fired so the next enqueue schedules anew.
    pub fn clear_scheduled(&self) {
        self.drain_scheduled.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_drain_scheduled(&self) -> bool {
        self.drain_scheduled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the queued entries in delivery order.
    #[must_use]
    pub fn entries(&self) -> Vec<RetryEntry> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_first_enqueue_requests_a_drain() {
        let queue = RetryQueue::new();
        assert!(queue.enqueue(RetryEntry::new(CollectionKey::Jobs, json!({}), 1)));
        assert!(!queue.enqueue(RetryEntry::new(CollectionKey::Notes, json!({}), 1)));
        assert_eq!(queue.len(), 2);

        queue.clear_scheduled();
        assert!(queue.enqueue(RetryEntry::new(CollectionKey::Jobs, json!({}), 1)));
    }

    #[test]
    fn take_all_empties_in_order() {
        let queue = RetryQueue::new();
        queue.enqueue(RetryEntry::new(CollectionKey::Jobs, json!({"n": 1}), 1));
        queue.enqueue(RetryEntry::new(CollectionKey::Jobs, json!({"n": 2}), 2));

        let taken = queue.take_all();
        assert!(queue.is_empty());
        assert_eq!(taken[0].data, json!({"n": 1}));
        assert_eq!(taken[1].data, json!({"n": 2}));
    }

    #[test]
    fn duplicates_are_kept() {
        let queue = RetryQueue::new();
        queue.enqueue(RetryEntry::new(CollectionKey::Notes, json!({"a": 1}), 1));
        queue.enqueue(RetryEntry::new(CollectionKey::Notes, json!({"a": 1}), 1));
        assert_eq!(queue.entries().len(), 2);
    }

    #[test]
    fn entry_is_superseded_only_by_later_versions() {
        let entry = RetryEntry::new(CollectionKey::Jobs, json!({}), 100);
        assert!(!entry.is_superseded_by(100));
        assert!(!entry.is_superseded_by(99));
        assert!(entry.is_superseded_by(101));
    }
}

//! Eviction Queue Module
//!
//! Tracks insertion order for the store's capacity policy: when the store is
//! full, expired entries go first, then the oldest-inserted live entry.
//! Re-setting a key counts as a fresh insertion.

use std::collections::BTreeMap;

// == Insertion Queue ==
/// Keys ordered by insertion sequence number.
///
/// Each insertion gets a new, strictly increasing sequence number, so the
/// smallest number is always the oldest write.
#[derive(Debug, Default)]
pub struct InsertionQueue {
    /// Sequence number -> key
    order: BTreeMap<u64, String>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl InsertionQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Records an insertion of `key` and returns its sequence number.
    ///
    /// The caller forgets any previous sequence number for the same key.
    pub fn push(&mut self, key: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        seq
    }

    // == Forget ==
    /// Drops the insertion recorded under `seq`.
    pub fn forget(&mut self, seq: u64) {
        self.order.remove(&seq);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest insertion.
    ///
    /// Returns None if the queue is empty.
    pub fn pop_oldest(&mut self) -> Option<(u64, String)> {
        self.order.pop_first()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Empties the queue. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.order.clear();
    }
}

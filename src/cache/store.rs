//! Cache Store Module
//!
//! Entry store combining HashMap storage with insertion-order eviction and
//! TTL expiration. The store is single-threaded; [`crate::cache::Cache`] wraps
//! it in a mutex for shared use.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{
    CacheCounters, CacheEntry, Clock, InsertionQueue, StoreStats, SystemClock, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Keyed storage with per-entry expiry and a maximum entry count.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Insertion order used for eviction
    queue: InsertionQueue,
    /// Hit/miss/eviction counters
    counters: CacheCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL in seconds for entries set without one
    default_ttl: u64,
    /// Sum of key and payload sizes
    memory_bytes: usize,
    clock: Arc<dyn Clock>,
    started_at: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self::with_clock(max_entries, default_ttl, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(max_entries: usize, default_ttl: u64, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now_ms();
        Self {
            entries: HashMap::new(),
            queue: InsertionQueue::new(),
            counters: CacheCounters::new(),
            max_entries,
            default_ttl,
            memory_bytes: 0,
            clock,
            started_at,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Set ==
    /// Stores a serialized value, replacing any existing entry for `key`.
    ///
    /// If the store is full, expired entries are purged first; if it is still
    /// full, the oldest-inserted entries are evicted until one slot is free.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The serialized value to store
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None), must be positive
    pub fn set(&mut self, key: String, value: Vec<u8>, ttl: Option<u64>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl == 0 {
            return Err(CacheError::InvalidTtl(key));
        }

        if self.max_entries == 0 {
            return Err(CacheError::CacheFull(
                "store is configured with zero capacity".to_string(),
            ));
        }

        // Full replacement: the old entry leaves the eviction queue too
        self.take(&key);

        if self.entries.len() >= self.max_entries {
            self.cleanup_expired();
        }
        while self.entries.len() >= self.max_entries {
            match self.queue.pop_oldest() {
                Some((_, evicted_key)) => {
                    if let Some(evicted) = self.entries.remove(&evicted_key) {
                        self.memory_bytes -= evicted.footprint(&evicted_key);
                    }
                    self.counters.record_eviction();
                    tracing::trace!(key = %evicted_key, "evicted oldest entry");
                }
                None => {
                    return Err(CacheError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let seq = self.queue.push(&key);
        let entry = CacheEntry::new(value, ttl, self.clock.now_ms(), seq);
        self.memory_bytes += entry.footprint(&key);
        self.entries.insert(key, entry);

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value by key, recording a hit or a miss.
    ///
    /// Expired entries count as misses and are removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.counters.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.take(key);
            self.counters.record_expirations(1);
        }
        self.counters.record_miss();
        None
    }

    // == Peek ==
    /// Like [`CacheStore::get`] but leaves the counters alone.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Returns true if `key` holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remaining lifetime of a live entry in seconds.
    pub fn ttl_remaining(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns 1 if a live entry was removed, 0 otherwise. An expired entry is
    /// still purged but reported as 0, since it was already invisible.
    pub fn delete(&mut self, key: &str) -> usize {
        let now = self.clock.now_ms();
        match self.take(key) {
            Some(entry) if entry.is_expired(now) => {
                self.counters.record_expirations(1);
                0
            }
            Some(_) => 1,
            None => 0,
        }
    }

    // == Delete Pattern ==
    /// Removes every key containing `pattern` as a literal substring.
    ///
    /// Returns the number of live entries removed. An empty pattern matches
    /// nothing.
    pub fn delete_pattern(&mut self, pattern: &str) -> usize {
        if pattern.is_empty() {
            return 0;
        }

        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        matching.iter().map(|key| self.delete(key)).sum()
    }

    // == Flush ==
    /// Removes all entries. Counters are kept.
    pub fn flush(&mut self) {
        self.entries.clear();
        self.queue.clear();
        self.memory_bytes = 0;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> StoreStats {
        let now = self.clock.now_ms();
        StoreStats {
            key_count: self.live_len(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            expirations: self.counters.expirations,
            memory_bytes: self.memory_bytes,
            uptime_secs: now.saturating_sub(self.started_at) / 1000,
        }
    }

    /// Zeroes the hit/miss/eviction counters.
    pub fn reset_stats(&mut self) {
        self.counters.reset();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.take(&key);
        }

        self.counters.record_expirations(count);
        count
    }

    /// Live keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of live entries.
    pub fn live_len(&self) -> usize {
        let now = self.clock.now_ms();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key` from the map and the eviction queue.
    fn take(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.queue.forget(entry.seq);
        self.memory_bytes -= entry.footprint(key);
        Some(entry)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn store_with_clock(max_entries: usize) -> (CacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = CacheStore::with_clock(max_entries, 600, clock.clone());
        (store, clock)
    }

    fn bytes(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100, 600);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.default_ttl(), 600);
        assert_eq!(store.max_entries(), 100);
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = store_with_clock(100);

        store.set("product:shoe-1".to_string(), bytes("v1"), None).unwrap();

        assert_eq!(store.get("product:shoe-1"), Some(bytes("v1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent_counts_miss() {
        let (mut store, _) = store_with_clock(100);

        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_store_delete() {
        let (mut store, _) = store_with_clock(100);

        store.set("key1".to_string(), bytes("value1"), None).unwrap();
        assert_eq!(store.delete("key1"), 1);
        assert_eq!(store.delete("key1"), 0);

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1".to_string(), bytes("value1"), Some(10)).unwrap();
        clock.advance_secs(8);
        store.set("key1".to_string(), bytes("value2"), Some(10)).unwrap();
        clock.advance_secs(8);

        assert_eq!(store.get("key1"), Some(bytes("value2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let (mut store, clock) = store_with_clock(100);

        store
            .set("category:electronics".to_string(), bytes("{}"), Some(7200))
            .unwrap();
        assert!(store.get("category:electronics").is_some());

        clock.advance_secs(7201);

        assert_eq!(store.get("category:electronics"), None);
        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key".to_string(), bytes("v"), None).unwrap();
        assert_eq!(store.ttl_remaining("key"), Some(600));

        clock.advance_secs(600);
        assert_eq!(store.get("key"), None);
    }

    #[test]
    fn test_store_rejects_zero_ttl() {
        let (mut store, _) = store_with_clock(100);

        let result = store.set("key".to_string(), bytes("v"), Some(0));
        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_evicts_oldest_inserted() {
        let (mut store, _) = store_with_clock(3);

        store.set("key1".to_string(), bytes("1"), None).unwrap();
        store.set("key2".to_string(), bytes("2"), None).unwrap();
        store.set("key3".to_string(), bytes("3"), None).unwrap();

        // Reads do not change eviction order
        store.get("key1");

        store.set("key4".to_string(), bytes("4"), None).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_reset_moves_key_to_back() {
        let (mut store, _) = store_with_clock(3);

        store.set("key1".to_string(), bytes("1"), None).unwrap();
        store.set("key2".to_string(), bytes("2"), None).unwrap();
        store.set("key3".to_string(), bytes("3"), None).unwrap();
        store.set("key1".to_string(), bytes("1b"), None).unwrap();

        store.set("key4".to_string(), bytes("4"), None).unwrap();

        assert!(store.contains("key1"));
        assert!(!store.contains("key2"));
    }

    #[test]
    fn test_store_prefers_expired_over_eviction() {
        let (mut store, clock) = store_with_clock(2);

        store.set("short".to_string(), bytes("1"), Some(5)).unwrap();
        store.set("long".to_string(), bytes("2"), Some(500)).unwrap();
        clock.advance_secs(10);

        store.set("new".to_string(), bytes("3"), None).unwrap();

        assert!(store.contains("long"));
        assert!(store.contains("new"));
        let stats = store.stats();
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_store_zero_capacity() {
        let (mut store, _) = store_with_clock(0);

        let result = store.set("key".to_string(), bytes("v"), None);
        assert!(matches!(result, Err(CacheError::CacheFull(_))));
    }

    #[test]
    fn test_delete_pattern_scope() {
        let (mut store, _) = store_with_clock(100);

        store.set("products:1:12:abc".to_string(), bytes("x"), None).unwrap();
        store.set("products:2:12:abc".to_string(), bytes("y"), None).unwrap();
        store.set("category:shoes".to_string(), bytes("z"), None).unwrap();

        assert_eq!(store.delete_pattern("products:"), 2);
        assert_eq!(store.keys(), vec!["category:shoes".to_string()]);
    }

    #[test]
    fn test_delete_pattern_is_literal() {
        let (mut store, _) = store_with_clock(100);

        store.set("products:1".to_string(), bytes("x"), None).unwrap();
        store.set("productsX1".to_string(), bytes("y"), None).unwrap();

        assert_eq!(store.delete_pattern("products.1"), 0);
        assert_eq!(store.delete_pattern(".*"), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_pattern_empty_matches_nothing() {
        let (mut store, _) = store_with_clock(100);
        store.set("a".to_string(), bytes("x"), None).unwrap();

        assert_eq!(store.delete_pattern(""), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_flush_keeps_counters() {
        let (mut store, _) = store_with_clock(100);

        store.set("a".to_string(), bytes("x"), None).unwrap();
        store.get("a");
        store.get("b");
        store.flush();

        assert!(store.is_empty());
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_bytes, 0);

        store.reset_stats();
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_store_stats() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1".to_string(), bytes("value1"), None).unwrap();
        store.get("key1");
        store.get("nonexistent");
        clock.advance_secs(42);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.key_count, 1);
        assert_eq!(stats.memory_bytes, "key1".len() + "value1".len());
        assert_eq!(stats.uptime_secs, 42);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1".to_string(), bytes("value1"), Some(1)).unwrap();
        store.set("key2".to_string(), bytes("value2"), Some(10)).unwrap();
        clock.advance_secs(2);

        // Expired but not yet purged
        assert_eq!(store.len(), 2);
        assert_eq!(store.live_len(), 1);

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_delete_expired_reports_zero() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key".to_string(), bytes("v"), Some(1)).unwrap();
        clock.advance_secs(1);

        assert_eq!(store.delete("key"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_key_too_long() {
        let (mut store, _) = store_with_clock(100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.set(long_key, bytes("value"), None);
        assert!(matches!(result, Err(CacheError::KeyTooLong { .. })));
    }

    #[test]
    fn test_peek_does_not_count() {
        let (mut store, _) = store_with_clock(100);
        store.set("a".to_string(), bytes("x"), None).unwrap();

        assert_eq!(store.peek("a"), Some(bytes("x")));
        assert_eq!(store.peek("b"), None);

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }
}

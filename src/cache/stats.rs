//! Cache Statistics Module
//!
//! Tracks cache performance counters and the snapshot returned by `stats()`.

use serde::Serialize;

// == Cache Counters ==
/// Process-lifetime counters kept by the store.
///
/// Counters only grow; they are reset by [`CacheCounters::reset`] or a restart,
/// never by a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed to make room under the capacity bound
    pub evictions: u64,
    /// Expired entries physically removed, on access or by a sweep
    pub expirations: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates counters all at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Expirations ==
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Reset ==
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Store Stats ==
/// Point-in-time view of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Live (non-expired) entries
    pub key_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Approximate bytes held by keys and payloads
    pub memory_bytes: usize,
    /// Seconds since the store was created
    pub uptime_secs: u64,
}

impl StoreStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.hits, self.misses)
    }
}

/// hits / (hits + misses), 0.0 with no lookups.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

//! Cache Service Module
//!
//! [`Cache`] is the handle callers share: typed `get`/`set` over the entry
//! store plus the cache-aside `cached` operation. It is constructed
//! explicitly and cloned into whatever needs it; there is no global instance.
//!
//! Internal faults (lock poisoning, payloads that fail to (de)serialize,
//! rejected writes) never reach the caller. They are logged at debug level
//! and turn into a miss or a no-op.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

use crate::cache::{CacheStore, Clock, EfficiencyThresholds, StoreStats, SystemClock};
use crate::config::Config;

/// Per-key gate serializing fetches for one key.
type Gate = Arc<tokio::sync::Mutex<()>>;

// == Cache ==
/// Shared, cloneable handle to one cache instance.
#[derive(Debug, Clone)]
pub struct Cache {
    inner: Arc<CacheInner>,
}

#[derive(Debug)]
struct CacheInner {
    store: Mutex<CacheStore>,
    in_flight: Mutex<HashMap<String, Gate>>,
    single_flight: bool,
    thresholds: EfficiencyThresholds,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache with default settings apart from capacity and TTL.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self::from_config(&Config {
            max_entries,
            default_ttl,
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let store = CacheStore::with_clock(config.max_entries, config.default_ttl, clock);
        Self {
            inner: Arc::new(CacheInner {
                store: Mutex::new(store),
                in_flight: Mutex::new(HashMap::new()),
                single_flight: config.single_flight,
                thresholds: EfficiencyThresholds::new(
                    config.excellent_threshold,
                    config.good_threshold,
                ),
            }),
        }
    }

    pub(crate) fn thresholds(&self) -> EfficiencyThresholds {
        self.inner.thresholds
    }

    /// Runs `op` against the locked store; `None` if the lock is poisoned.
    fn with_store<R>(&self, op: &str, f: impl FnOnce(&mut CacheStore) -> R) -> Option<R> {
        match self.inner.store.lock() {
            Ok(mut store) => Some(f(&mut store)),
            Err(_) => {
                debug!(op, "cache store lock poisoned, skipping");
                None
            }
        }
    }

    // == Get ==
    /// Returns a copy of the live value under `key`, recording a hit or miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.with_store("get", |store| store.get(key)).flatten()?;
        decode(key, &bytes)
    }

    /// Like [`Cache::get`] without touching the hit/miss counters.
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.with_store("peek", |store| store.peek(key)).flatten()?;
        decode(key, &bytes)
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl` is in seconds and must be positive; `None` uses the default TTL.
    /// Returns false if the value was not stored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.put(key, bytes, ttl),
            Err(err) => {
                debug!(key, error = %err, "failed to serialize cache value");
                false
            }
        }
    }

    fn put(&self, key: &str, bytes: Vec<u8>, ttl: Option<u64>) -> bool {
        match self.with_store("set", |store| store.set(key.to_string(), bytes, ttl)) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                debug!(key, error = %err, "cache write rejected");
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes `key`. Returns true if a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.with_store("delete", |store| store.delete(key));
        removed.unwrap_or(0) > 0
    }

    /// Removes every key containing `pattern` literally; returns how many.
    pub fn delete_pattern(&self, pattern: &str) -> usize {
        self.with_store("delete_pattern", |store| store.delete_pattern(pattern))
            .unwrap_or(0)
    }

    /// Removes all entries. Counters survive.
    pub fn flush(&self) {
        self.with_store("flush", CacheStore::flush);
    }

    // == Maintenance ==
    /// Physically removes expired entries; returns how many.
    pub fn purge_expired(&self) -> usize {
        self.with_store("purge_expired", CacheStore::cleanup_expired)
            .unwrap_or(0)
    }

    pub fn reset_stats(&self) {
        self.with_store("reset_stats", CacheStore::reset_stats);
    }

    // == Introspection ==
    pub fn stats(&self) -> StoreStats {
        self.with_store("stats", |store| store.stats())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.with_store("contains", |store| store.contains(key))
            .unwrap_or(false)
    }

    pub fn ttl_remaining(&self, key: &str) -> Option<u64> {
        self.with_store("ttl_remaining", |store| store.ttl_remaining(key))
            .flatten()
    }

    pub fn keys(&self) -> Vec<String> {
        self.with_store("keys", |store| store.keys())
            .unwrap_or_default()
    }

    // == Cache-Aside ==
    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// On a hit `fetch` is never called. On a miss its result is stored with
    /// `ttl` (or the default TTL) unless it serializes to `null`, and returned.
    /// A fetch error is returned unchanged and nothing is stored.
    ///
    /// With single-flight enabled, concurrent misses on the same key wait for
    /// the first fetch and reuse its stored result. When single-flight is off,
    /// every concurrent miss runs its own fetch and the last write wins.
    pub async fn cached<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<u64>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key) {
            trace!(key, "cache hit");
            return Ok(value);
        }

        if !self.inner.single_flight {
            return self.fetch_and_store(key, ttl, fetch).await;
        }

        let gate = InFlight::enter(&self.inner.in_flight, key);
        let _permit = gate.lock().await;

        // Another caller may have filled the key while we waited
        if let Some(value) = self.peek::<T>(key) {
            debug!(key, "served by concurrent fetch");
            return Ok(value);
        }

        self.fetch_and_store(key, ttl, fetch).await
    }

    async fn fetch_and_store<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<u64>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        trace!(key, "cache miss, fetching");
        let value = fetch().await?;

        match serde_json::to_vec(&value) {
            Ok(bytes) if bytes == b"null" => trace!(key, "fetch returned nothing, not cached"),
            Ok(bytes) => {
                self.put(key, bytes, ttl);
            }
            Err(err) => debug!(key, error = %err, "failed to serialize fetched value"),
        }

        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(key, error = %err, "cached value has unexpected shape");
            None
        }
    }
}

// == In-Flight Registry ==
/// Membership in the in-flight registry for one key.
///
/// The registry entry is removed when the last member leaves.
struct InFlight<'a> {
    registry: &'a Mutex<HashMap<String, Gate>>,
    key: String,
    gate: Gate,
}

impl<'a> InFlight<'a> {
    fn enter(registry: &'a Mutex<HashMap<String, Gate>>, key: &str) -> Self {
        let gate = match registry.lock() {
            Ok(mut map) => map.entry(key.to_string()).or_default().clone(),
            // Poisoned registry: fall back to a private gate, which means no collapsing
            Err(_) => Gate::default(),
        };
        Self {
            registry,
            key: key.to_string(),
            gate,
        }
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Ok(mut map) = self.registry.lock() else {
            return;
        };
        // Registered handle + ours means nobody else is waiting
        let last = map
            .get(&self.key)
            .is_some_and(|gate| Arc::ptr_eq(gate, &self.gate) && Arc::strong_count(gate) <= 2);
        if last {
            map.remove(&self.key);
        }
    }
}

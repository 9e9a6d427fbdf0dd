//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A single stored payload with its lifetime metadata.
///
/// The payload is the JSON encoding of the caller's value, so the store owns
/// its own copy and readers always get a fresh one back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Serialized value
    pub value: Vec<u8>,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Position in the eviction queue
    pub seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` after `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl_seconds` - TTL in seconds, already validated as positive
    /// * `now_ms` - Insertion time
    /// * `seq` - Eviction queue position assigned by the store
    pub fn new(value: Vec<u8>, ttl_seconds: u64, now_ms: u64, seq: u64) -> Self {
        Self {
            value,
            inserted_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is visible only while the current time is strictly before
    /// `expires_at`; at the boundary it is already gone.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Returns remaining TTL in whole seconds, 0 once expired.
    pub fn ttl_remaining(&self, now_ms: u64) -> u64 {
        self.ttl_remaining_ms(now_ms) / 1000
    }

    /// Approximate heap footprint of the entry, key included.
    pub fn footprint(&self, key: &str) -> usize {
        key.len() + self.value.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(b"\"shoe\"".to_vec(), 60, 10_000, 1);

        assert_eq!(entry.value, b"\"shoe\"");
        assert_eq!(entry.inserted_at, 10_000);
        assert_eq!(entry.expires_at, 70_000);
        assert!(!entry.is_expired(10_000));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(b"1".to_vec(), 1, 0, 0);

        assert!(!entry.is_expired(999));
        assert!(entry.is_expired(1_001));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(b"1".to_vec(), 5, 1_000, 0);

        // Expired exactly at expires_at
        assert!(entry.is_expired(6_000), "Entry should be expired at boundary");
        assert!(!entry.is_expired(5_999));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(b"1".to_vec(), 10, 0, 0);

        assert_eq!(entry.ttl_remaining_ms(500), 9_500);
        assert_eq!(entry.ttl_remaining(500), 9);
        assert_eq!(entry.ttl_remaining(20_000), 0);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new(b"1".to_vec(), u64::MAX, 1_000, 0);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired(u64::MAX - 1));
    }

    #[test]
    fn test_footprint() {
        let entry = CacheEntry::new(b"abcd".to_vec(), 10, 0, 0);
        assert_eq!(entry.footprint("product:x"), 13);
    }
}

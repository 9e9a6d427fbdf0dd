//! Cache Module
//!
//! In-process cache-aside layer with TTL expiration, namespaced keys,
//! pattern invalidation and hit/miss telemetry.

mod clock;
mod entry;
mod eviction;
mod invalidation;
pub mod keys;
mod service;
mod stats;
mod store;
mod telemetry;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use eviction::InsertionQueue;
pub use service::Cache;
pub use stats::{hit_rate, CacheCounters, StoreStats};
pub use store::CacheStore;
pub use telemetry::{Efficiency, EfficiencyThresholds, PerformanceReport};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;

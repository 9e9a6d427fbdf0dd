//! Storefront Cache - in-process cache-aside layer for a storefront
//!
//! Shields the backing store from repeated catalog, category and search reads
//! with TTL entries, collision-free keys, pattern invalidation and hit/miss
//! telemetry.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{keys, Cache};
pub use config::Config;
pub use error::CacheError;
pub use tasks::{spawn_cleanup_task, warm_up, WarmupPlan, WarmupTask};

//! Background Tasks Module
//!
//! Contains tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiration sweep: removes expired cache entries at configured intervals
//! - Warm-up: pre-populates known-hot keys at startup or on demand

mod cleanup;
mod warmup;

pub use cleanup::spawn_cleanup_task;
pub use warmup::{warm_up, WarmupFailure, WarmupPlan, WarmupReport, WarmupTask};

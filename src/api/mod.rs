//! API Module
//!
//! HTTP handlers and routing for the back-office cache panel. The panel only
//! inspects and invalidates; reads and writes go through [`crate::cache::Cache`]
//! in-process.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Store statistics
//! - `GET /cache/performance` - Hit rate and efficiency rating
//! - `DELETE /cache` - Flush the cache
//! - `DELETE /cache/keys/:key` - Delete one key
//! - `POST /cache/invalidate[/...]` - Pattern and per-family invalidation
//! - `POST /cache/warm` - Run the warm-up plan

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! API Routes
//!
//! Configures the Axum router for the cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_key_handler, flush_handler, health_handler, invalidate_category_handler,
    invalidate_pattern_handler, invalidate_product_handler, invalidate_search_handler,
    performance_handler, stats_handler, warm_handler, AppState,
};

/// Creates the admin router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /cache/stats` - Store statistics
/// - `GET /cache/performance` - Hit rate and efficiency rating
/// - `DELETE /cache` - Flush every entry
/// - `DELETE /cache/keys/:key` - Delete one key
/// - `POST /cache/invalidate` - Delete every key containing a pattern
/// - `POST /cache/invalidate/products/:slug` - Product invalidation
/// - `POST /cache/invalidate/categories/:slug` - Category invalidation
/// - `POST /cache/invalidate/search` - Drop all search results
/// - `POST /cache/warm` - Run the warm-up plan
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache", delete(flush_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/performance", get(performance_handler))
        .route("/cache/keys/:key", delete(delete_key_handler))
        .route("/cache/invalidate", post(invalidate_pattern_handler))
        .route(
            "/cache/invalidate/products/:slug",
            post(invalidate_product_handler),
        )
        .route(
            "/cache/invalidate/categories/:slug",
            post(invalidate_category_handler),
        )
        .route("/cache/invalidate/search", post(invalidate_search_handler))
        .route("/cache/warm", post(warm_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

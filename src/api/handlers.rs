//! API Handlers
//!
//! HTTP request handlers for the back-office cache panel.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{keys, Cache, PerformanceReport, StoreStats};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{FlushResponse, HealthResponse, InvalidatePatternRequest, InvalidationResponse};
use crate::tasks::{warm_up, WarmupPlan, WarmupReport};

/// Application state shared across all handlers.
///
/// `Cache` is already a cheap, thread-safe handle, so no extra locking here.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Cache,
    /// Keys warmed by POST /cache/warm
    pub warmup: WarmupPlan,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            warmup: WarmupPlan::new(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The warm-up plan starts empty: the host owns the fetchers, so it must
    /// register them with [`AppState::with_warmup`] before startup warm-up or
    /// `POST /cache/warm` have anything to do.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Cache::from_config(config))
    }

    /// Replaces the warm-up plan run at startup and by `POST /cache/warm`.
    pub fn with_warmup(mut self, plan: WarmupPlan) -> Self {
        self.warmup = plan;
        self
    }
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.cache.stats())
}

/// Handler for GET /cache/performance
pub async fn performance_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.cache.performance())
}

/// Handler for DELETE /cache
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    state.cache.flush();
    info!("Cache flushed via admin API");
    Json(FlushResponse::new())
}

/// Handler for DELETE /cache/keys/:key
///
/// Responds 404 if no live entry was removed.
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }
    Ok(Json(InvalidationResponse::new(key, 1)))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidationResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete_pattern(&req.pattern);
    info!(pattern = %req.pattern, removed, "Pattern invalidated via admin API");
    Ok(Json(InvalidationResponse::new(req.pattern, removed)))
}

/// Handler for POST /cache/invalidate/products/:slug
pub async fn invalidate_product_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<InvalidationResponse> {
    let removed = state.cache.invalidate_product(&slug);
    Json(InvalidationResponse::new(keys::product_key(&slug), removed))
}

/// Handler for POST /cache/invalidate/categories/:slug
pub async fn invalidate_category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<InvalidationResponse> {
    let removed = state.cache.invalidate_category(&slug);
    Json(InvalidationResponse::new(keys::category_key(&slug), removed))
}

/// Handler for POST /cache/invalidate/search
pub async fn invalidate_search_handler(
    State(state): State<AppState>,
) -> Json<InvalidationResponse> {
    let removed = state.cache.invalidate_search();
    Json(InvalidationResponse::new("search", removed))
}

/// Handler for POST /cache/warm
pub async fn warm_handler(State(state): State<AppState>) -> Json<WarmupReport> {
    Json(warm_up(&state.cache, &state.warmup).await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

//! API Handlers
//!
//! HTTP request handlers for each prefetch service endpoint. Handlers are thin:
//! they validate input, call into the warmer, scheduler or cache, and shape
//! the response.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::error::Result;
use crate::fetch::FetchExecutor;
use crate::media::MediaCache;
use crate::models::{
    CacheQuery, CacheStatusResponse, ClearResponse, FeedLoadedRequest, HealthResponse,
    PrefetchRequest, StatsResponse, ViewportRequest, ViewportResponse,
};
use crate::prefetch::{BatchOutcome, FeedWarmer, Prefetcher, WarmupReport};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MediaCache>,
    pub prefetcher: Arc<Prefetcher>,
    pub warmer: Arc<FeedWarmer>,
}

impl AppState {
    /// Creates the state around an existing warmer.
    pub fn new(warmer: Arc<FeedWarmer>) -> Self {
        let prefetcher = warmer.prefetcher().clone();
        Self {
            cache: prefetcher.cache().clone(),
            prefetcher,
            warmer,
        }
    }

    /// Wires a scheduler and warmer over `cache` and `executor`.
    pub fn build(cache: Arc<MediaCache>, executor: FetchExecutor) -> Self {
        let prefetcher = Arc::new(Prefetcher::new(cache, executor));
        Self::new(Arc::new(FeedWarmer::new(prefetcher)))
    }
}

/// Handler for POST /feed/loaded
///
/// Returns once the first visible images are cached; the deeper warm-up keeps
/// running in the background.
pub async fn feed_loaded_handler(
    State(state): State<AppState>,
    Json(req): Json<FeedLoadedRequest>,
) -> Json<WarmupReport> {
    Json(state.warmer.on_feed_loaded(&req.articles).await)
}

/// Handler for POST /feed/viewport
pub async fn viewport_handler(
    State(state): State<AppState>,
    Json(req): Json<ViewportRequest>,
) -> Json<ViewportResponse> {
    let scheduled = state
        .warmer
        .on_viewport_index_changed(&req.articles, req.current_index);
    Json(ViewportResponse { scheduled })
}

/// Handler for POST /prefetch
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Json(req): Json<PrefetchRequest>,
) -> Result<Json<BatchOutcome>> {
    req.validate()?;
    let outcome = state.prefetcher.request_batch(&req.urls).await;
    debug!(
        submitted = outcome.submitted,
        cached = outcome.cached,
        "Explicit prefetch finished"
    );
    Ok(Json(outcome))
}

/// Handler for GET /cache?url=
pub async fn cache_status_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<CacheStatusResponse>> {
    let url = query.validate()?;
    let cached = state.cache.is_cached(url);
    let dimensions = state.cache.dimensions(url);
    Ok(Json(CacheStatusResponse::new(url, cached, dimensions)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear().await;
    Json(ClearResponse::cleared())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.prefetcher.stats();
    Json(StatsResponse::new(&stats, state.warmer.state()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

//! API Routes
//!
//! Configures the Axum router with all prefetch service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_status_handler, clear_handler, feed_loaded_handler, health_handler, prefetch_handler,
    stats_handler, viewport_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/feed/loaded", post(feed_loaded_handler))
        .route("/feed/viewport", post(viewport_handler))
        .route("/prefetch", post(prefetch_handler))
        .route("/cache", get(cache_status_handler).delete(clear_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

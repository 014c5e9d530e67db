//! Response DTOs for the prefetch service API

use serde::Serialize;

use crate::cache::{CacheStats, Dimensions, Warmth};
use crate::prefetch::WarmupState;

/// Response body for GET /cache
///
/// `width`/`height`/`aspectRatio` always carry a usable layout size: the
/// resolved one, or the default placeholder when resolution failed or the
/// URL is not cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    pub url: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

impl CacheStatusResponse {
    pub fn new(url: impl Into<String>, cached: bool, dimensions: Option<Dimensions>) -> Self {
        let layout = dimensions.unwrap_or(Dimensions::DEFAULT);
        Self {
            url: url.into(),
            cached,
            dimensions,
            width: layout.width,
            height: layout.height,
            aspect_ratio: layout.aspect_ratio(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_entries: usize,
    pub in_flight: usize,
    pub evictions: u64,
    pub hits: u64,
    pub misses: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub prefetched: u64,
    pub failed: u64,
    pub warmup_state: WarmupState,
    pub warmth: Warmth,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, warmup_state: WarmupState) -> Self {
        Self {
            total_entries: stats.total_entries,
            in_flight: stats.in_flight,
            evictions: stats.evictions,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            prefetched: stats.prefetched,
            failed: stats.failed,
            warmup_state,
            warmth: stats.warmth(),
        }
    }
}

/// Response body for POST /feed/viewport
#[derive(Debug, Clone, Serialize)]
pub struct ViewportResponse {
    /// URLs handed to the prefetcher for this window
    pub scheduled: usize,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Image cache cleared".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

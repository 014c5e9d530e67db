//! Request and Response models for the prefetch service API
//!
//! DTOs for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{CacheQuery, FeedLoadedRequest, PrefetchRequest, ViewportRequest};
pub use responses::{
    CacheStatusResponse, ClearResponse, HealthResponse, StatsResponse, ViewportResponse,
};

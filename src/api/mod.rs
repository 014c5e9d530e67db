//! API Module
//!
//! HTTP handlers and routing for the prefetch service REST API.
//!
//! # Endpoints
//! - `POST /feed/loaded` - Feed content arrived; preload the first screen
//! - `POST /feed/viewport` - Visible index changed; refresh the prefetch window
//! - `POST /prefetch` - Prefetch an explicit list of image URLs
//! - `GET /cache?url=` - Readiness and layout size for one URL
//! - `DELETE /cache` - Clear the image cache
//! - `GET /stats` - Cache and prefetch statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

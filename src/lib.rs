//! Feed Prefetch - media cache and image prefetch service
//!
//! Keeps a bounded, persisted record of which feed images are already warm,
//! prefetches the ones a reader is about to see, and answers readiness and
//! layout-size queries for the view layer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod models;
pub mod persistence;
pub mod prefetch;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{MediaError, Result};
pub use media::MediaCache;
pub use prefetch::{FeedArticle, FeedWarmer, Prefetcher};
pub use tasks::spawn_expiry_sweep;

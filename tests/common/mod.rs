//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use feed_prefetch::cache::Dimensions;
use feed_prefetch::fetch::{FetchExecutor, ImageLoader};
use feed_prefetch::persistence::MemorySnapshotStorage;
use feed_prefetch::{AppState, MediaCache, MediaError};

pub const FIXTURE_DIMENSIONS: Dimensions = Dimensions {
    width: 640,
    height: 480,
};

/// Loader that succeeds after `delay` unless the URL was marked failing.
#[derive(Debug, Default)]
pub struct FixtureLoader {
    delay: Duration,
    failing: Mutex<HashSet<String>>,
    primed: Mutex<Vec<String>>,
}

impl FixtureLoader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn primed(&self) -> Vec<String> {
        self.primed.lock().clone()
    }

    pub fn forget_calls(&self) {
        self.primed.lock().clear();
    }
}

#[async_trait]
impl ImageLoader for FixtureLoader {
    async fn prime(&self, url: &str) -> feed_prefetch::Result<()> {
        self.primed.lock().push(url.to_string());
        tokio::time::sleep(self.delay).await;
        if self.failing.lock().contains(url) {
            return Err(MediaError::Network(format!("connection refused: {url}")));
        }
        Ok(())
    }

    async fn resolve_dimensions(&self, _url: &str) -> feed_prefetch::Result<Dimensions> {
        Ok(FIXTURE_DIMENSIONS)
    }
}

pub async fn test_state(loader: Arc<FixtureLoader>) -> AppState {
    let cache = Arc::new(MediaCache::open(Arc::new(MemorySnapshotStorage::new())).await);
    AppState::build(cache, FetchExecutor::new(loader, Duration::from_secs(15)))
}

pub fn image_url(index: usize) -> String {
    format!("https://cdn.example.com/articles/{index}.jpg")
}

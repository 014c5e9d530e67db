//! Scriptable in-memory loader for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache::Dimensions;
use crate::error::{MediaError, Result};
use crate::fetch::ImageLoader;

pub const STUB_DIMENSIONS: Dimensions = Dimensions {
    width: 1200,
    height: 800,
};

#[derive(Debug, Default)]
pub struct StubLoader {
    delay: Duration,
    failing: Mutex<HashSet<String>>,
    no_dimensions: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    hanging_dimensions: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    outstanding: AtomicUsize,
    peak: AtomicUsize,
}

impl StubLoader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn recover(&self, url: &str) {
        self.failing.lock().remove(url);
    }

    pub fn fail_dimensions(&self, url: &str) {
        self.no_dimensions.lock().insert(url.to_string());
    }

    pub fn hang(&self, url: &str) {
        self.hanging.lock().insert(url.to_string());
    }

    pub fn hang_dimensions(&self, url: &str) {
        self.hanging_dimensions.lock().insert(url.to_string());
    }

    /// URLs passed to `prime`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    /// Highest number of simultaneously running `prime` calls.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageLoader for StubLoader {
    async fn prime(&self, url: &str) -> Result<()> {
        self.calls.lock().push(url.to_string());
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let hang = self.hanging.lock().contains(url);
        if hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.delay).await;
        self.outstanding.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(url) {
            return Err(MediaError::Network(format!("connection reset: {url}")));
        }
        Ok(())
    }

    async fn resolve_dimensions(&self, url: &str) -> Result<Dimensions> {
        let hang = self.hanging_dimensions.lock().contains(url);
        if hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.delay / 2).await;
        if self.no_dimensions.lock().contains(url) {
            return Err(MediaError::Decode("truncated header".to_string()));
        }
        Ok(STUB_DIMENSIONS)
    }
}

//! Fetch Executor Module
//!
//! Performs the network work for one resource: priming plus dimension lookup.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use crate::cache::Dimensions;
use crate::error::{MediaError, Result};
use crate::fetch::ImageLoader;

/// Default bound on each sub-operation of a fetch
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetched {
    /// None when dimension resolution failed; the bytes were still primed
    pub dimensions: Option<Dimensions>,
}

// == Fetch Executor ==
/// Runs one fetch at a time per call, with no retry of its own.
#[derive(Clone)]
pub struct FetchExecutor {
    loader: Arc<dyn ImageLoader>,
    timeout: Duration,
}

impl FetchExecutor {
    pub fn new(loader: Arc<dyn ImageLoader>, timeout: Duration) -> Self {
        Self { loader, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // == Fetch ==
    /// Primes `url` and resolves its dimensions concurrently.
    ///
    /// Succeeds iff priming succeeds within the timeout. A failed or stalled
    /// dimension lookup degrades to `dimensions: None`.
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        if url.trim().is_empty() {
            return Err(MediaError::InvalidKey(url.to_string()));
        }

        let primed = async {
            match time::timeout(self.timeout, self.loader.prime(url)).await {
                Ok(result) => result,
                Err(_) => Err(MediaError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                }),
            }
        };
        let resolved = async { Ok::<_, MediaError>(self.resolve_dimensions(url).await) };

        // A prime failure settles the fetch without waiting on the dimension lookup
        let ((), dimensions) = tokio::try_join!(primed, resolved)?;

        Ok(Fetched { dimensions })
    }

    async fn resolve_dimensions(&self, url: &str) -> Option<Dimensions> {
        match time::timeout(self.timeout, self.loader.resolve_dimensions(url)).await {
            Ok(Ok(dimensions)) => Some(dimensions),
            Ok(Err(err)) => {
                debug!(url = %url, error = %err, "Dimension lookup failed");
                None
            }
            Err(_) => {
                debug!(url = %url, "Dimension lookup timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::{StubLoader, STUB_DIMENSIONS};

    const URL: &str = "https://cdn.test/a.jpg";

    fn executor(loader: &Arc<StubLoader>) -> FetchExecutor {
        FetchExecutor::new(loader.clone(), FETCH_TIMEOUT)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_success() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(50)));

        let fetched = executor(&loader).fetch(URL).await.unwrap();

        assert_eq!(fetched.dimensions, Some(STUB_DIMENSIONS));
        assert_eq!(loader.call_count(URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dimension_failure_degrades() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(50)));
        loader.fail_dimensions(URL);

        let fetched = executor(&loader).fetch(URL).await.unwrap();
        assert!(fetched.dimensions.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prime_failure_fails_fetch() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(50)));
        loader.fail(URL);

        let result = executor(&loader).fetch(URL).await;
        assert!(matches!(result, Err(MediaError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_prime_times_out() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(50)));
        loader.hang(URL);

        let started = time::Instant::now();
        let result = executor(&loader).fetch(URL).await;

        assert!(matches!(result, Err(MediaError::Timeout { .. })));
        assert!(started.elapsed() >= FETCH_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prime_failure_does_not_wait_for_dimensions() {
        let loader = Arc::new(StubLoader::new(Duration::ZERO));
        loader.fail(URL);
        loader.hang_dimensions(URL);

        let started = time::Instant::now();
        let result = executor(&loader).fetch(URL).await;

        assert!(matches!(result, Err(MediaError::Network(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_dimensions_degrade_after_timeout() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(50)));
        loader.hang_dimensions(URL);

        let started = time::Instant::now();
        let fetched = executor(&loader).fetch(URL).await.unwrap();

        assert!(fetched.dimensions.is_none());
        assert!(started.elapsed() >= FETCH_TIMEOUT);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let loader = Arc::new(StubLoader::new(Duration::ZERO));

        let result = executor(&loader).fetch("  ").await;

        assert!(matches!(result, Err(MediaError::InvalidKey(_))));
        assert!(loader.calls().is_empty());
    }
}

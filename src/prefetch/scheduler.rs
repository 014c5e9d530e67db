//! Prefetch Scheduler Module
//!
//! Bounded-concurrency runner that deduplicates against the cache and the
//! in-flight set before handing keys to the fetch executor.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats};
use crate::fetch::FetchExecutor;
use crate::media::MediaCache;

/// Ceiling on simultaneously outstanding fetches
pub const MAX_CONCURRENT_PREFETCH: usize = 12;

/// Summary of one `request_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Keys that survived filtering and were dispatched
    pub submitted: usize,
    /// Dispatched keys that ended up cached
    pub cached: usize,
}

// == In-Flight Guard ==
/// Holds a key in the in-flight set; releasing happens on drop, whatever the
/// fetch outcome, so a failed or cancelled key can be requested again.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

// == Prefetcher ==
/// Owns the in-flight set; dispatches accepted keys to the executor.
pub struct Prefetcher {
    cache: Arc<MediaCache>,
    executor: FetchExecutor,
    in_flight: Mutex<HashSet<String>>,
    max_concurrent: usize,
}

impl Prefetcher {
    // == Constructor ==
    pub fn new(cache: Arc<MediaCache>, executor: FetchExecutor) -> Self {
        Self::with_limit(cache, executor, MAX_CONCURRENT_PREFETCH)
    }

    pub fn with_limit(cache: Arc<MediaCache>, executor: FetchExecutor, max_concurrent: usize) -> Self {
        Self {
            cache,
            executor,
            in_flight: Mutex::new(HashSet::new()),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    // == Claim ==
    /// Atomically admits `key` into the in-flight set.
    ///
    /// The cache check runs under the in-flight lock. Completions insert into
    /// the cache before releasing their key, so a key is never both cached
    /// and re-fetched.
    fn claim(&self, key: &str) -> Option<InFlightGuard<'_>> {
        if key.trim().is_empty() {
            return None;
        }

        let mut in_flight = self.in_flight.lock();
        if in_flight.contains(key)
            || in_flight.len() >= self.max_concurrent
            || self.cache.contains(key)
        {
            return None;
        }
        in_flight.insert(key.to_string());

        Some(InFlightGuard {
            in_flight: &self.in_flight,
            key: key.to_string(),
        })
    }

    // == Request ==
    /// Fetches a single key.
    ///
    /// Returns `false` without fetching when the key is empty, cached, in
    /// flight, or the in-flight set is full. Saturated requests are dropped,
    /// not queued; callers re-request on a later wave. Otherwise returns
    /// whether the fetch succeeded and the key is now cached.
    pub async fn request(&self, key: &str) -> bool {
        let Some(_guard) = self.claim(key) else {
            debug!(url = %key, "Prefetch skipped");
            return false;
        };

        match self.executor.fetch(key).await {
            Ok(fetched) => {
                self.cache.insert(CacheEntry::new(key, fetched.dimensions));
                self.cache.counters().record_prefetched();
                debug!(url = %key, "Prefetched image");
                true
            }
            Err(err) => {
                self.cache.counters().record_failure();
                warn!(url = %key, error = %err, "Failed to prefetch image");
                false
            }
        }
    }

    // == Request Batch ==
    /// Fetches many keys, at most `max_concurrent` at a time.
    ///
    /// Empty, cached, in-flight and repeated keys are dropped up front.
    /// Chunks run in input order and each chunk settles before the next starts.
    pub async fn request_batch<I, S>(&self, keys: I) -> BatchOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pending = self.filter_pending(keys);
        if pending.is_empty() {
            return BatchOutcome::default();
        }

        let mut outcome = BatchOutcome {
            submitted: pending.len(),
            cached: 0,
        };
        for chunk in pending.chunks(self.max_concurrent) {
            let settled = join_all(chunk.iter().map(|key| self.request(key))).await;
            outcome.cached += settled.into_iter().filter(|ok| *ok).count();
        }

        debug!(
            "Prefetch batch settled: {} of {} cached",
            outcome.cached, outcome.submitted
        );
        outcome
    }

    /// Keys from `keys` worth dispatching, deduplicated, order kept.
    pub fn filter_pending<I, S>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let in_flight = self.in_flight.lock();
        keys.into_iter()
            .map(|key| key.as_ref().to_string())
            .filter(|key| {
                !key.trim().is_empty()
                    && !in_flight.contains(key)
                    && !self.cache.contains(key)
                    && seen.insert(key.clone())
            })
            .collect()
    }

    // == Introspection ==
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.lock().contains(key)
    }

    /// Cache stats plus the current in-flight count.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.cache.stats();
        stats.in_flight = self.in_flight_count();
        stats
    }
}

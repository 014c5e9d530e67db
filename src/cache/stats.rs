//! Cache Statistics Module
//!
//! Tracks readiness lookups, evictions and prefetch outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Warmth ==
/// Coarse tier describing how much of the feed is already pre-warmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Warmth {
    Building,
    Good,
    Excellent,
}

impl Warmth {
    pub fn from_entries(total_entries: usize) -> Self {
        match total_entries {
            n if n > 50 => Warmth::Excellent,
            n if n > 20 => Warmth::Good,
            _ => Warmth::Building,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache and prefetch metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Readiness lookups that found an entry
    pub hits: u64,
    /// Readiness lookups that found nothing
    pub misses: u64,
    /// Entries removed by the size rule
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Fetches currently outstanding
    pub in_flight: usize,
    /// Fetches that completed and were cached
    pub prefetched: u64,
    /// Fetches that failed or timed out
    pub failed: u64,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn warmth(&self) -> Warmth {
        Warmth::from_entries(self.total_entries)
    }
}

// == Counters ==
/// Lock-free counters shared by the lookup and prefetch paths.
#[derive(Debug, Default)]
pub struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    prefetched: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prefetched(&self) {
        self.prefetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters into `stats`.
    pub fn fill(&self, stats: &mut CacheStats) {
        stats.hits = self.hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        stats.prefetched = self.prefetched.load(Ordering::Relaxed);
        stats.failed = self.failed.load(Ordering::Relaxed);
    }
}

//! Cache Store Module
//!
//! Metadata store combining HashMap storage with insertion-order eviction and expiry.

use std::collections::{BTreeMap, HashMap};

use crate::cache::{
    current_timestamp_ms, CacheEntry, InsertionOrder, EVICTION_SLACK, MAX_CACHE_SIZE,
};

/// Persisted form of the store, keyed by URL.
pub type Snapshot = BTreeMap<String, CacheEntry>;

// == Cache Store ==
/// Image metadata keyed by URL, bounded in size.
#[derive(Debug)]
pub struct CacheStore {
    /// URL to entry
    entries: HashMap<String, CacheEntry>,
    /// Oldest-first eviction index
    order: InsertionOrder,
    /// Total entries removed by the size rule
    evictions: u64,
    /// Ceiling that triggers eviction
    max_entries: usize,
    /// Extra entries removed once the ceiling is crossed
    eviction_slack: usize,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(MAX_CACHE_SIZE, EVICTION_SLACK)
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_entries` - Size above which eviction runs
    /// * `eviction_slack` - How far below `max_entries` eviction shrinks the store
    pub fn new(max_entries: usize, eviction_slack: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            evictions: 0,
            max_entries,
            eviction_slack,
        }
    }

    // == Has ==
    /// True iff an unexpired entry exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Get ==
    /// Returns the entry for `key` unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Put ==
    /// Inserts or overwrites an entry.
    ///
    /// Crossing `max_entries` evicts the oldest entries down to
    /// `max_entries - eviction_slack`. Returns the evicted keys.
    pub fn put(&mut self, entry: CacheEntry) -> Vec<String> {
        self.insert_unbounded(entry);
        self.enforce_limit()
    }

    // == Hydrate ==
    /// Bulk-inserts loaded entries and applies the size rule once at the end.
    ///
    /// Returns the number of entries evicted.
    pub fn hydrate(&mut self, entries: impl IntoIterator<Item = CacheEntry>) -> usize {
        for entry in entries {
            self.insert_unbounded(entry);
        }
        self.enforce_limit().len()
    }

    fn insert_unbounded(&mut self, entry: CacheEntry) {
        self.order.record(&entry.url, entry.inserted_at);
        self.entries.insert(entry.url.clone(), entry);
    }

    fn enforce_limit(&mut self) -> Vec<String> {
        if self.entries.len() <= self.max_entries {
            return Vec::new();
        }

        let target = self.max_entries.saturating_sub(self.eviction_slack);
        let mut evicted = Vec::with_capacity(self.entries.len() - target);
        while self.entries.len() > target {
            let Some(key) = self.order.pop_oldest() else {
                break;
            };
            self.entries.remove(&key);
            evicted.push(key);
        }

        self.evictions += evicted.len() as u64;
        evicted
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.url.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.order.remove(key);
        }

        expired.len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Snapshot ==
    /// Copies every entry into its persisted form.
    pub fn snapshot(&self) -> Snapshot {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

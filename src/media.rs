//! Media Cache
//!
//! The constructed cache service: the metadata store, its snapshot writer and
//! the readiness queries the view layer makes before rendering an image.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, CacheStore, Counters, Dimensions};
use crate::persistence::{self, SnapshotStorage, SnapshotWriter, SAVE_DEBOUNCE};

// == Media Cache ==
/// Owned cache state. Construct one per process (or per test) and share it by `Arc`.
#[derive(Debug)]
pub struct MediaCache {
    store: Arc<RwLock<CacheStore>>,
    writer: SnapshotWriter,
    counters: Counters,
}

impl MediaCache {
    // == Constructor ==
    /// Creates the cache and hydrates it from `storage`.
    pub async fn open(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self::open_with(storage, CacheStore::default(), SAVE_DEBOUNCE).await
    }

    /// Like `open`, with an explicit store and debounce window.
    pub async fn open_with(
        storage: Arc<dyn SnapshotStorage>,
        mut store: CacheStore,
        debounce: Duration,
    ) -> Self {
        let entries = persistence::load(storage.as_ref()).await;
        let evicted = store.hydrate(entries);
        if evicted > 0 {
            debug!("Evicted {} entries while hydrating", evicted);
        }
        info!("Image cache ready with {} entries", store.len());

        let store = Arc::new(RwLock::new(store));
        let source = Arc::clone(&store);
        let writer = SnapshotWriter::spawn(storage, debounce, move || source.read().snapshot());

        Self {
            store,
            writer,
            counters: Counters::new(),
        }
    }

    // == Readiness Queries ==
    /// View-layer readiness check; counted as a hit or miss.
    pub fn is_cached(&self, url: &str) -> bool {
        let hit = self.contains(url);
        self.counters.record_lookup(hit);
        hit
    }

    /// Membership test used by the prefetch path; not counted.
    pub fn contains(&self, url: &str) -> bool {
        self.store.read().has(url)
    }

    /// Resolved dimensions, if the entry exists and resolution succeeded.
    pub fn dimensions(&self, url: &str) -> Option<Dimensions> {
        self.store.read().get(url).and_then(|entry| entry.dimensions)
    }

    pub fn entry(&self, url: &str) -> Option<CacheEntry> {
        self.store.read().get(url).cloned()
    }

    // == Insert ==
    /// Stores an entry and schedules a debounced snapshot write.
    pub fn insert(&self, entry: CacheEntry) {
        let evicted = self.store.write().put(entry);
        if !evicted.is_empty() {
            debug!("Evicted {} oldest image entries", evicted.len());
        }
        self.writer.mark_dirty();
    }

    // == Purge ==
    /// Drops expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let removed = self.store.write().purge_expired();
        if removed > 0 {
            self.writer.mark_dirty();
        }
        removed
    }

    // == Clear ==
    /// Empties the cache and deletes the persisted snapshot.
    pub async fn clear(&self) {
        self.store.write().clear();
        self.writer.discard().await;
        info!("Image cache cleared");
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::new();
        {
            let store = self.store.read();
            stats.total_entries = store.len();
            stats.evictions = store.evictions();
        }
        self.counters.fill(&mut stats);
        stats
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    // == Lifecycle ==
    /// Writes any pending snapshot now.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Flushes and stops the snapshot writer.
    pub async fn shutdown(&self) {
        self.writer.shutdown().await;
    }
}

//! Cache Module
//!
//! In-memory image metadata store with expiry and size-bounded eviction.

mod entry;
mod order;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, Dimensions};
pub use order::InsertionOrder;
pub use stats::{CacheStats, Counters, Warmth};
pub use store::{CacheStore, Snapshot};

// == Public Constants ==
/// Size ceiling of the store
pub const MAX_CACHE_SIZE: usize = 500;

/// Entries evicted beyond the ceiling so that eviction does not run on every insert
pub const EVICTION_SLACK: usize = 10;

/// Age at which an entry stops counting as cached
pub const CACHE_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

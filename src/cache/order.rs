//! Insertion Order Module
//!
//! Tracks entries by insertion time for oldest-first eviction.

use std::collections::{BTreeMap, HashMap};

/// Ordering position: insertion timestamp, then a sequence number so that
/// entries stamped within the same millisecond keep their insertion order.
type Position = (u64, u64);

// == Insertion Order ==
/// Index of keys ordered by `(inserted_at, sequence)`.
///
/// The first element of `index` is always the oldest key.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    index: BTreeMap<Position, String>,
    positions: HashMap<String, Position>,
    next_seq: u64,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Records `key` as inserted at `inserted_at`, replacing any earlier position.
    pub fn record(&mut self, key: &str, inserted_at: u64) {
        self.remove(key);
        let position = (inserted_at, self.next_seq);
        self.next_seq += 1;
        self.index.insert(position, key.to_string());
        self.positions.insert(key.to_string(), position);
    }

    // == Remove ==
    /// Removes a key from the index. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(position) = self.positions.remove(key) {
            self.index.remove(&position);
        }
    }

    // == Pop Oldest ==
    /// Removes and returns the oldest key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.index.pop_first()?;
        self.positions.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.positions.clear();
    }
}

//! Persistence Module
//!
//! Best-effort durability for cache metadata across restarts.

mod snapshot;
mod storage;

pub use snapshot::{load, save, SnapshotWriter, SAVE_DEBOUNCE, SNAPSHOT_KEY};
pub use storage::{FileSnapshotStorage, MemorySnapshotStorage, SnapshotStorage};

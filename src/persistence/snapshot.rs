//! Snapshot Module
//!
//! Loads persisted cache metadata at startup and writes it back, debounced.
//! Persistence is best-effort: every failure here is logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, CacheEntry, Snapshot};
use crate::error::Result;
use crate::persistence::SnapshotStorage;

/// Storage key the snapshot lives under
pub const SNAPSHOT_KEY: &str = "image_prefetch_cache";

/// Quiet period after the last mutation before a snapshot is written
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

// == Load ==
/// Reads the persisted snapshot and returns its unexpired entries.
///
/// A missing, unreadable or corrupt snapshot yields an empty result.
pub async fn load(storage: &dyn SnapshotStorage) -> Vec<CacheEntry> {
    let snapshot = match read(storage).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            debug!("No persisted image snapshot found");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %err, "Unusable image snapshot, starting empty");
            return Vec::new();
        }
    };

    let now = current_timestamp_ms();
    let total = snapshot.len();
    let entries: Vec<CacheEntry> = snapshot
        .into_iter()
        .filter(|(key, entry)| !key.is_empty() && !entry.is_expired_at(now))
        .map(|(key, mut entry)| {
            // The map key is authoritative
            entry.url = key;
            entry
        })
        .collect();

    info!(
        "Loaded {} image entries from snapshot ({} expired or invalid dropped)",
        entries.len(),
        total - entries.len()
    );
    entries
}

async fn read(storage: &dyn SnapshotStorage) -> Result<Option<Snapshot>> {
    match storage.read_snapshot(SNAPSHOT_KEY).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

// == Save ==
/// Serializes and writes `snapshot`. Failures are logged, never returned.
pub async fn save(storage: &dyn SnapshotStorage, snapshot: &Snapshot) {
    match write(storage, snapshot).await {
        Ok(()) => debug!("Saved {} image entries to snapshot", snapshot.len()),
        Err(err) => warn!(error = %err, "Failed to save image snapshot"),
    }
}

async fn write(storage: &dyn SnapshotStorage, snapshot: &Snapshot) -> Result<()> {
    let bytes = serde_json::to_vec(snapshot)?;
    storage.write_snapshot(SNAPSHOT_KEY, bytes).await
}

// == Snapshot Writer ==
enum Command {
    MarkDirty,
    Flush(oneshot::Sender<()>),
    Discard(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the single task that owns all snapshot writes.
///
/// Mutations only mark the cache dirty. The writer takes the snapshot from
/// its source when the quiet period ends, so each write captures the latest
/// state once. Commands are applied in the order they are sent, so a discard
/// can never be overtaken by a save that was scheduled before it.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SnapshotWriter {
    /// Spawns the writer task over `source`. Must be called inside a tokio runtime.
    pub fn spawn<F>(storage: Arc<dyn SnapshotStorage>, debounce: Duration, source: F) -> Self
    where
        F: Fn() -> Snapshot + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(storage, debounce, source, rx));
        Self {
            tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    // == Mark Dirty ==
    /// Schedules a write once `debounce` passes without another mutation.
    pub fn mark_dirty(&self) {
        if self.tx.send(Command::MarkDirty).is_err() {
            debug!("Snapshot writer stopped, dropping save");
        }
    }

    /// Writes the pending snapshot, if any, without waiting for the debounce.
    pub async fn flush(&self) {
        self.round_trip(Command::Flush).await;
    }

    /// Cancels any pending write and deletes the stored snapshot.
    pub async fn discard(&self) {
        self.round_trip(Command::Discard).await;
    }

    /// Flushes and stops the writer task.
    pub async fn shutdown(&self) {
        self.round_trip(Command::Shutdown).await;
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "Snapshot writer task ended abnormally");
            }
        }
    }

    async fn round_trip(&self, make: impl FnOnce(oneshot::Sender<()>) -> Command) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(make(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn run_writer<F>(
    storage: Arc<dyn SnapshotStorage>,
    debounce: Duration,
    source: F,
    mut rx: mpsc::UnboundedReceiver<Command>,
) where
    F: Fn() -> Snapshot + Send + 'static,
{
    let mut dirty = false;
    let deadline = time::sleep(debounce);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::MarkDirty) => {
                    dirty = true;
                    deadline.as_mut().reset(Instant::now() + debounce);
                }
                Some(Command::Flush(ack)) => {
                    if std::mem::take(&mut dirty) {
                        save(storage.as_ref(), &source()).await;
                    }
                    let _ = ack.send(());
                }
                Some(Command::Discard(ack)) => {
                    dirty = false;
                    if let Err(err) = storage.delete_snapshot(SNAPSHOT_KEY).await {
                        warn!(error = %err, "Failed to delete image snapshot");
                    }
                    let _ = ack.send(());
                }
                Some(Command::Shutdown(ack)) => {
                    if dirty {
                        save(storage.as_ref(), &source()).await;
                    }
                    let _ = ack.send(());
                    break;
                }
                None => {
                    if dirty {
                        save(storage.as_ref(), &source()).await;
                    }
                    break;
                }
            },
            () = &mut deadline, if dirty => {
                dirty = false;
                save(storage.as_ref(), &source()).await;
            }
        }
    }

    debug!("Snapshot writer stopped");
}

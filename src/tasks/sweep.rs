//! Expiry Sweep Task
//!
//! Periodically drops entries older than the cache expiry so long-running
//! processes do not wait for a restart to shed stale metadata.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::media::MediaCache;

/// Spawns the sweep loop. Abort the returned handle to stop it.
pub fn spawn_expiry_sweep(cache: Arc<MediaCache>, interval_secs: u64) -> JoinHandle<()> {
    // A zero interval would spin
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

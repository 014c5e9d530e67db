//! Tracked detached tasks.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Set of fire-and-forget tasks that stays joinable for shutdown.
///
/// Each task is its own error boundary: a panic is logged when the task is
/// reaped and never reaches the spawner.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    set: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` onto the current runtime, reaping any finished tasks first.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.set.lock();
        while let Some(result) = set.try_join_next() {
            log_outcome(result);
        }
        set.spawn(async move {
            task.await;
            debug!(task = name, "Background task finished");
        });
    }

    /// Tasks spawned and not yet reaped.
    pub fn len(&self) -> usize {
        self.set.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until every task, including ones spawned meanwhile, has finished.
    pub async fn drain(&self) {
        loop {
            let mut set = std::mem::take(&mut *self.set.lock());
            if set.is_empty() {
                return;
            }
            while let Some(result) = set.join_next().await {
                log_outcome(result);
            }
        }
    }

    pub fn abort_all(&self) {
        self.set.lock().abort_all();
    }

    /// Drains for up to `grace`, then aborts whatever is left.
    ///
    /// Returns true if everything finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        // Tasks moved into an abandoned drain are aborted when its JoinSet drops
        let finished = tokio::time::timeout(grace, self.drain()).await.is_ok();
        if !finished {
            warn!("Background tasks still running after {:?}, aborting", grace);
            self.abort_all();
        }
        finished
    }
}

fn log_outcome(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(err) if err.is_panic() => warn!(error = %err, "Background task panicked"),
        Err(err) => debug!(error = %err, "Background task cancelled"),
    }
}

//! TTL Sweep Task
//!
//! Stoppable background timer that periodically reclaims expired entries.
//! Lookups already ignore expired entries, so the sweep only frees memory.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::images::ImageCache;

// == Sweep Task ==
/// Handle to a running sweep timer.
#[derive(Debug)]
pub struct SweepTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Stops the timer. A sweep in progress is abandoned.
    pub fn stop(&self) {
        self.handle.abort();
        debug!("{} sweep stopped", self.name);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Spawns a timer that calls `sweep` every `interval` and logs what it removed.
///
/// The first sweep runs one full interval after spawning.
///
/// # Example
/// ```ignore
/// let task = spawn_sweep_task("response", Duration::from_secs(300), move || {
///     let cache = cache.clone();
///     async move { cache.write().await.cleanup_expired() }
/// });
/// // Later, during shutdown:
/// task.stop();
/// ```
pub fn spawn_sweep_task<F, Fut>(name: &'static str, interval: Duration, sweep: F) -> SweepTask
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = usize> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        info!(
            "Starting {} sweep task with interval of {:?}",
            name, interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep().await;
            if removed > 0 {
                info!("{} sweep: removed {} expired entries", name, removed);
            } else {
                debug!("{} sweep: no expired entries found", name);
            }
        }
    });

    SweepTask { name, handle }
}

/// Sweeps a shared response cache every `interval`.
pub fn spawn_response_sweeper(cache: Arc<RwLock<ResponseCache>>, interval: Duration) -> SweepTask {
    spawn_sweep_task("response cache", interval, move || {
        let cache = Arc::clone(&cache);
        async move { cache.write().await.cleanup_expired() }
    })
}

/// Sweeps an image cache every `interval`.
///
/// Storage access is synchronous, so each sweep runs on the blocking pool.
pub fn spawn_image_sweeper(cache: ImageCache, interval: Duration) -> SweepTask {
    spawn_sweep_task("image cache", interval, move || {
        let cache = cache.clone();
        async move {
            tokio::task::spawn_blocking(move || cache.cleanup_expired_images())
                .await
                .unwrap_or(0)
        }
    })
}

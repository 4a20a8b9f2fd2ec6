//! Feed liveness tracking.
//!
//! The session stamps [`LastSeen`] on every heartbeat and every push of a
//! subscribed stream. A [`LivenessMonitor`] task samples it on a fixed
//! interval and fires once the feed has been silent for longer than the
//! threshold.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Last time the feed showed signs of life.
///
/// Stored as milliseconds since creation so it can be shared without a lock.
#[derive(Debug)]
pub struct LastSeen {
    origin: Instant,
    millis: AtomicU64,
}

impl LastSeen {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            millis: AtomicU64::new(0),
        }
    }

    pub fn touch(&self) {
        let elapsed = self.origin.elapsed().as_millis() as u64;
        self.millis.store(elapsed, Ordering::Relaxed);
    }

    /// Time since the last touch (or since creation).
    pub fn silent_for(&self) -> Duration {
        let last = self.origin + Duration::from_millis(self.millis.load(Ordering::Relaxed));
        Instant::now().saturating_duration_since(last)
    }
}

impl Default for LastSeen {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task watching a [`LastSeen`]. Aborted on drop.
#[derive(Debug)]
pub struct LivenessMonitor {
    expired: oneshot::Receiver<Duration>,
    task: JoinHandle<()>,
}

impl LivenessMonitor {
    pub fn spawn(last_seen: Arc<LastSeen>, interval: Duration, threshold: Duration) -> Self {
        let (tx, expired) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let silent_for = last_seen.silent_for();
                if silent_for > threshold {
                    warn!(silent_ms = silent_for.as_millis() as u64, "Feed went silent");
                    let _ = tx.send(silent_for);
                    return;
                }
                debug!(silent_ms = silent_for.as_millis() as u64, "Feed alive");
            }
        });

        Self { expired, task }
    }

    /// Resolves with the silent duration once the threshold is exceeded.
    /// Cancel-safe.
    pub async fn expired(&mut self) -> Duration {
        match (&mut self.expired).await {
            Ok(silent_for) => silent_for,
            // Monitor aborted: never fires
            Err(_) => std::future::pending().await,
        }
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

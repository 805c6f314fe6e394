//! Periodic background flush of live visits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use vt_store::SessionStore;

use crate::clock::Clock;
use crate::tracker::VisitTracker;

/// How often live visits are flushed to the store when the caller does not
/// configure an interval.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to a running synchronizer task.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stops the synchronizer after one final flush and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.task.await {
            tracing::warn!(%error, "synchronizer task failed");
        }
    }
}

/// Spawns a task that calls [`VisitTracker::sync_open_tabs`] every `period`.
///
/// A flush that fails only logs inside the tracker; the loop keeps ticking
/// and the next pass rewrites the same state. Shutdown runs one last flush so
/// activity accrued since the previous tick is not lost.
pub fn spawn_periodic_sync<S, C>(tracker: Arc<VisitTracker<S, C>>, period: Duration) -> SyncHandle
where
    S: SessionStore + 'static,
    C: Clock + 'static,
{
    let (shutdown, mut observer) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; skip it so a flush only
        // happens once a full period has elapsed
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => tracker.sync_open_tabs().await,
                changed = observer.changed() => {
                    if changed.is_err() || *observer.borrow() {
                        tracker.sync_open_tabs().await;
                        return;
                    }
                }
            }
        }
    });
    SyncHandle { shutdown, task }
}

//! Periodic sync scheduling.
//!
//! One repeating timer drives automatic passes. Stopping the timer only
//! prevents future ticks; a pass already in flight runs to completion.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a running periodic timer.
pub struct SyncTimer {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncTimer {
    /// Spawn a timer that invokes `tick` every `interval`.
    ///
    /// The first invocation happens one full interval after the spawn,
    /// not immediately.
    pub fn spawn<F, Fut>(interval: Duration, tick: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately once; consume that so the first
            // real tick lands after one interval.
            ticker.tick().await;

            info!("Automatic sync started, interval {:?}", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Periodic sync tick");
                        tick().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Automatic sync stopped");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Prevent all future ticks. Does not cancel a tick already running.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether the timer task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SyncTimer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

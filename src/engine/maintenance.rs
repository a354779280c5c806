// src/engine/maintenance.rs

//! Background loop for periodic telemetry flushing and history cleanup.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::engine::history::CommandHistory;

/// Handle to the loop started by [`spawn_maintenance`].
///
/// Dropping the handle closes the cancel channel, which also stops the loop,
/// but nothing waits for it to finish.
#[derive(Debug)]
pub struct MaintenanceHandle {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stop the loop and wait for it to exit. The loop flushes buffered
    /// telemetry one last time before returning.
    pub async fn shutdown(mut self) {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!("maintenance loop already finished");
            }
        }
        if let Err(err) = self.handle.await {
            warn!(error = %err, "maintenance loop terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn the maintenance loop on the current Tokio runtime.
///
/// - every `flush_every`: send buffered telemetry.
/// - every `cleanup_every`: re-apply the size bound and prune unreachable
///   entries.
///
/// The first tick of each timer fires one full period after spawning.
pub fn spawn_maintenance(
    history: Arc<Mutex<CommandHistory>>,
    flush_every: Duration,
    cleanup_every: Duration,
) -> MaintenanceHandle {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        info!(?flush_every, ?cleanup_every, "maintenance loop started");

        let mut flush = interval_at(Instant::now() + flush_every, flush_every);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cleanup = interval_at(Instant::now() + cleanup_every, cleanup_every);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    break;
                }
                _ = flush.tick() => {
                    let sent = history.lock().await.flush_telemetry().await;
                    if sent > 0 {
                        debug!(sent, "periodic telemetry flush");
                    }
                }
                _ = cleanup.tick() => {
                    let removed = history.lock().await.cleanup();
                    if removed > 0 {
                        debug!(removed, "periodic history cleanup");
                    }
                }
            }
        }

        history.lock().await.flush_telemetry().await;
        info!("maintenance loop stopped");
    });

    MaintenanceHandle {
        cancel: Some(cancel_tx),
        handle,
    }
}

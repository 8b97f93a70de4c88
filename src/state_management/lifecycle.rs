use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use crate::errors::ElevatorResult;

/// Manages the shutdown signal shared by a component and the task running its loop.
///
/// Unlike a bare `Notify`, the signal is level-triggered: a task that starts waiting after
/// `trigger_shutdown` still observes it.
pub struct Lifecycle {
    /// Signal for triggering and waiting for shutdown.
    shutdown_signal: watch::Sender<bool>,
    /// Boolean flag to indicate if shutdown has been triggered.
    shutdown_triggered: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (shutdown_signal, _) = watch::channel(false);
        Self {
            shutdown_signal,
            shutdown_triggered: AtomicBool::new(false),
        }
    }

    /// Waits for the shutdown signal.
    ///
    /// Returns immediately if shutdown has already been triggered.
    pub async fn wait_for_shutdown(&self) {
        let mut receiver = self.shutdown_signal.subscribe();
        // The sender lives as long as `self`, so this cannot fail while we are borrowed.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Triggers the shutdown signal.
    ///
    /// Returns `false` when shutdown had already been triggered.
    pub fn trigger_shutdown(&self) -> bool {
        if self.shutdown_triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.shutdown_signal.send_replace(true);
        true
    }

    /// Checks if the shutdown signal has been triggered.
    pub fn is_shutdown_triggered(&self) -> bool {
        self.shutdown_triggered.load(Ordering::SeqCst)
    }

    /// Sleeps for a fixed duration unless shutdown is triggered first.
    ///
    /// # Returns
    ///
    /// `true` if the full duration elapsed, `false` if the sleep was cut short by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.wait_for_shutdown() => false,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for one task to finish within `grace`, aborting it if it does not.
///
/// # Returns
///
/// * `Ok(false)` if the task stopped on its own
/// * `Ok(true)` if it had to be aborted
/// * `Err(ElevatorError::TaskJoinError)` if it panicked
pub async fn join_task(name: &str, mut handle: JoinHandle<()>, grace: Duration) -> ElevatorResult<bool> {
    match timeout(grace, &mut handle).await {
        Ok(joined) => {
            joined?;
            debug!("{} stopped", name);
            Ok(false)
        }
        Err(_) => {
            warn!("{} did not stop within {:?}, aborting", name, grace);
            handle.abort();
            Ok(true)
        }
    }
}

/// Waits for each named task to finish within `grace`, aborting any that does not.
///
/// # Returns
///
/// The number of tasks that had to be aborted.
pub async fn join_with_grace(handles: Vec<(String, JoinHandle<()>)>, grace: Duration) -> usize {
    let waits = handles.into_iter().map(|(name, handle)| async move {
        join_task(&name, handle, grace).await.unwrap_or_else(|e| {
            warn!("{} ended abnormally: {}", name, e);
            false
        })
    });

    let aborted = join_all(waits).await.into_iter().filter(|aborted| *aborted).count();
    info!("All tasks joined ({} aborted)", aborted);
    aborted
}

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use crate::dispatch::Dispatcher;
use crate::state_management::Lifecycle;

/// Re-runs the dispatcher's assignment pass on a fixed interval
///
/// Calls that no unit could take when they were made stay waiting in the pending table; this
/// worker retries them independently of new calls arriving.
pub struct RedispatchWorker {
    dispatcher: Weak<Dispatcher>,
    check_interval: Duration,
    lifecycle: Arc<Lifecycle>,
}

impl RedispatchWorker {
    /// Creates a new RedispatchWorker
    ///
    /// # Arguments
    ///
    /// * `dispatcher` - The dispatcher whose pending calls are retried. Held weakly so the worker never keeps it alive
    /// * `check_interval` - The time between two passes
    /// * `lifecycle` - The dispatcher's shutdown signal
    pub fn new(dispatcher: Weak<Dispatcher>, check_interval: Duration, lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            dispatcher,
            check_interval,
            lifecycle,
        }
    }

    /// Runs the worker until shutdown, or until the dispatcher is dropped
    pub async fn run(self) {
        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Re-dispatch worker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(dispatcher) = self.dispatcher.upgrade() else {
                        break;
                    };
                    let pending = dispatcher.pending_count();
                    if pending > 0 {
                        let assigned = dispatcher.dispatch_pending();
                        debug!("Re-dispatch pass: {} level(s) pending, {} call(s) assigned", pending, assigned);
                    }
                }
                _ = self.lifecycle.wait_for_shutdown() => break,
            }
        }
        info!("Re-dispatch worker stopped");
    }
}

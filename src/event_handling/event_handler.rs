use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use crate::dispatch::{CallStatus, PendingCallTable};
use crate::errors::{ElevatorError, ElevatorResult};
use crate::event_handling::observer::{ObserverRegistry, UnitObserver};
use crate::models::{ArrivalEvent, UnitEvent};
use crate::state_management::Lifecycle;

/// Forwards every event of a unit into the dispatcher's event queue.
///
/// Sending never blocks, so a unit loop is never held up by the dispatcher.
pub struct EventForwarder {
    sender: mpsc::UnboundedSender<UnitEvent>,
}

impl EventForwarder {
    pub fn new(sender: mpsc::UnboundedSender<UnitEvent>) -> Self {
        Self { sender }
    }
}

impl UnitObserver for EventForwarder {
    fn name(&self) -> &str {
        "dispatcher-forwarder"
    }

    fn handle(&self, event: &UnitEvent) -> ElevatorResult<()> {
        self.sender.send(event.clone())
            .map_err(|e| ElevatorError::ObserverError(format!("Dispatcher event queue closed: {}", e)))
    }
}

/// Processes unit events on behalf of the dispatcher.
///
/// Arrivals settle the pending call table; every event is then re-published to the dispatcher's
/// system observers.
pub struct EventHandler {
    /// A queue for receiving `UnitEvent`s from every registered unit.
    event_queue: mpsc::UnboundedReceiver<UnitEvent>,
    /// The dispatcher's pending call table.
    pending: Arc<PendingCallTable>,
    /// Observers interested in system-wide events.
    system_observers: Arc<ObserverRegistry>,
    /// The dispatcher's shutdown signal.
    lifecycle: Arc<Lifecycle>,
}

impl EventHandler {
    pub fn new(
        event_queue: mpsc::UnboundedReceiver<UnitEvent>,
        pending: Arc<PendingCallTable>,
        system_observers: Arc<ObserverRegistry>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            event_queue,
            pending,
            system_observers,
            lifecycle,
        }
    }

    /// Runs the event handler until the dispatcher shuts down or every sender is gone.
    pub async fn run(mut self) {
        info!("EventHandler started");
        loop {
            tokio::select! {
                event = self.event_queue.recv() => match event {
                    Some(event) => self.process_event(&event),
                    None => break,
                },
                _ = self.lifecycle.wait_for_shutdown() => break,
            }
        }
        info!("EventHandler stopped");
    }

    /// Processes a single unit event.
    pub fn process_event(&self, event: &UnitEvent) {
        debug!("Processing event from unit {} at level {}: {:?}", event.unit_id(), event.level(), event);
        if let UnitEvent::Arrival(arrival) = event {
            self.settle_arrival(arrival);
        }
        self.system_observers.publish(event);
    }

    /// Clears the call an arrival served.
    ///
    /// Only the pickup the unit reports removing from its set counts as served. The arrival's
    /// snapshot alone is not enough: it may predate an assignment made while the event was queued.
    /// A deferred pickup leaves the call pending.
    fn settle_arrival(&self, arrival: &ArrivalEvent) {
        if let Some(direction) = arrival.served {
            if arrival.snapshot.has_pickup(arrival.level, direction) {
                debug!("Unit {} still holds a {} pickup at level {}", arrival.unit_id, direction, arrival.level);
            } else if self.pending.clear(arrival.level, direction) {
                info!("Cleared {} call at level {} served by unit {}", direction, arrival.level, arrival.unit_id);
            }
        }

        if let Some(direction) = arrival.deferred {
            match self.pending.status(arrival.level, direction) {
                Some(CallStatus::Assigned { unit_id }) if unit_id == arrival.unit_id => {
                    info!("Unit {} was full at level {}, {} call stays pending", arrival.unit_id, arrival.level, direction);
                }
                _ => debug!("Unit {} deferred a {} pickup at level {}", arrival.unit_id, direction, arrival.level),
            }
        }
    }
}

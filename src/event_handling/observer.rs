//! # Unit Observers
//!
//! Observers subscribe to the `UnitEvent`s published by a transport unit or re-published by the dispatcher.
//! Delivery is fire-and-forget: an observer returning an error or panicking is logged and skipped,
//! and never stalls the loop that published the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{error, warn};
use crate::errors::ElevatorResult;
use crate::models::{ArrivalEvent, DirectionChangedEvent, DoorsEvent, UnitEvent, UnitSnapshot};

/// A subscriber to unit notifications. Every callback defaults to a no-op.
pub trait UnitObserver: Send + Sync {
    /// A short name used when logging failures of this observer
    fn name(&self) -> &str {
        "observer"
    }

    fn on_arrival(&self, _event: &ArrivalEvent) -> ElevatorResult<()> {
        Ok(())
    }

    fn on_doors_open(&self, _event: &DoorsEvent) -> ElevatorResult<()> {
        Ok(())
    }

    fn on_doors_close(&self, _event: &DoorsEvent) -> ElevatorResult<()> {
        Ok(())
    }

    fn on_direction_change(&self, _event: &DirectionChangedEvent) -> ElevatorResult<()> {
        Ok(())
    }

    fn on_status_update(&self, _snapshot: &UnitSnapshot) -> ElevatorResult<()> {
        Ok(())
    }

    /// Routes an event to the matching callback
    fn handle(&self, event: &UnitEvent) -> ElevatorResult<()> {
        match event {
            UnitEvent::Arrival(e) => self.on_arrival(e),
            UnitEvent::DoorsOpen(e) => self.on_doors_open(e),
            UnitEvent::DoorsClose(e) => self.on_doors_close(e),
            UnitEvent::DirectionChanged(e) => self.on_direction_change(e),
            UnitEvent::StatusUpdate(s) => self.on_status_update(s),
        }
    }
}

/// Adapts a closure over `&UnitEvent` into a `UnitObserver`
pub struct FnObserver<F> {
    name: String,
    callback: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&UnitEvent) -> ElevatorResult<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self { name: name.into(), callback }
    }
}

impl<F> UnitObserver for FnObserver<F>
where
    F: Fn(&UnitEvent) -> ElevatorResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &UnitEvent) -> ElevatorResult<()> {
        (self.callback)(event)
    }
}

/// Handle returned by `ObserverRegistry::subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// A list of observers receiving every published event in subscription order
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: RwLock<Vec<(ObserverId, Arc<dyn UnitObserver>)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn UnitObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Removes an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Delivers an event to every observer.
    ///
    /// The list is copied before delivery so observers may subscribe or unsubscribe from inside a callback.
    pub fn publish(&self, event: &UnitEvent) {
        let observers: Vec<Arc<dyn UnitObserver>> = self.observers.read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Observer '{}' failed on {:?}: {}", observer.name(), event, e),
                Err(_) => error!("Observer '{}' panicked while handling an event from unit {}", observer.name(), event.unit_id()),
            }
        }
    }

    pub fn publish_all(&self, events: &[UnitEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! # Dispatcher
//!
//! The `Dispatcher` owns the unit registry and the pending call table. Calls enter through
//! [`Dispatcher::request_call`], which runs an assignment pass straight away; a background
//! re-dispatch worker repeats the pass on a fixed interval so that calls no unit could take
//! are retried.
//!
//! Unit events reach the dispatcher through an unbounded channel and are processed by the
//! `EventHandler` task, which settles served calls and re-publishes every event to the system
//! observers.

use std::sync::Arc;
use std::time::Duration;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::config::TimingSettings;
use crate::controllers::{RequestSets, TransportUnit};
use crate::dispatch::assignment::{select_unit, Selection};
use crate::dispatch::pending_calls::{CallStatus, PendingCall, PendingCallTable};
use crate::errors::{ElevatorError, ElevatorResult};
use crate::event_handling::event_handler::{EventForwarder, EventHandler};
use crate::event_handling::observer::{ObserverId, ObserverRegistry, UnitObserver};
use crate::models::{CallDirection, Direction, Level, LevelBounds, RunState, UnitEvent, UnitSnapshot};
use crate::monitoring::RedispatchWorker;
use crate::state_management::{join_with_grace, Lifecycle};

pub struct Dispatcher {
    bounds: LevelBounds,
    redispatch_interval: Duration,
    shutdown_grace: Duration,
    /// Registered units in registration order
    units: RwLock<Vec<Arc<TransportUnit>>>,
    pending: Arc<PendingCallTable>,
    /// Serialises the choose-and-claim step of assignment passes. Never held while calling a unit
    pass_guard: Mutex<()>,
    system_observers: Arc<ObserverRegistry>,
    event_sender: mpsc::UnboundedSender<UnitEvent>,
    event_receiver: Mutex<Option<mpsc::UnboundedReceiver<UnitEvent>>>,
    lifecycle: Arc<Lifecycle>,
    /// Handles of every task started by this dispatcher, joined on shutdown
    tasks: Mutex<Vec<(String, JoinHandle<()>)>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no units. Call [`Dispatcher::start`] to run its background tasks.
    pub fn new(bounds: LevelBounds, timing: &TimingSettings) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            bounds,
            redispatch_interval: timing.redispatch_interval(),
            shutdown_grace: timing.shutdown_grace(),
            units: RwLock::new(Vec::new()),
            pending: Arc::new(PendingCallTable::new()),
            pass_guard: Mutex::new(()),
            system_observers: Arc::new(ObserverRegistry::new()),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
            lifecycle: Arc::new(Lifecycle::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the event handler and the re-dispatch worker. Calling it again has no effect.
    pub fn start(self: &Arc<Self>) {
        let Some(event_queue) = self.event_receiver.lock().take() else {
            debug!("Dispatcher already started");
            return;
        };

        let event_handler = EventHandler::new(
            event_queue,
            Arc::clone(&self.pending),
            Arc::clone(&self.system_observers),
            Arc::clone(&self.lifecycle),
        );
        let worker = RedispatchWorker::new(Arc::downgrade(self), self.redispatch_interval, Arc::clone(&self.lifecycle));

        let mut tasks = self.tasks.lock();
        tasks.push(("Event handler".to_string(), tokio::spawn(event_handler.run())));
        tasks.push(("Re-dispatch worker".to_string(), tokio::spawn(worker.run())));
        info!("Dispatcher started, re-dispatch every {:?}", self.redispatch_interval);
    }

    /// Registers a unit, subscribes to its events and starts its control loop.
    ///
    /// # Returns
    ///
    /// * `Err(ElevatorError::ConfigError)` if a unit with the same id is already registered
    /// * `Err(ElevatorError::DispatcherShutDown)` after `shutdown`
    pub fn add_unit(&self, unit: Arc<TransportUnit>) -> ElevatorResult<()> {
        if self.is_shut_down() {
            return Err(ElevatorError::DispatcherShutDown);
        }
        {
            let mut units = self.units.write();
            if units.iter().any(|registered| registered.id() == unit.id()) {
                return Err(ElevatorError::ConfigError(format!("Unit {} is already registered", unit.id())));
            }
            unit.subscribe(Arc::new(EventForwarder::new(self.event_sender.clone())));
            units.push(Arc::clone(&unit));
        }

        let handle = unit.start();
        self.tasks.lock().push((format!("Unit {}", unit.id()), handle));
        info!("Registered unit {} at level {} with capacity {}", unit.id(), unit.level(), unit.capacity());
        Ok(())
    }

    /// Registered units in registration order.
    pub fn units(&self) -> Vec<Arc<TransportUnit>> {
        self.units.read().clone()
    }

    pub fn unit(&self, unit_id: u32) -> ElevatorResult<Arc<TransportUnit>> {
        self.units.read()
            .iter()
            .find(|unit| unit.id() == unit_id)
            .cloned()
            .ok_or(ElevatorError::UnitNotFound(unit_id))
    }

    pub fn bounds(&self) -> LevelBounds {
        self.bounds
    }

    /// Records a floor call and tries to assign it right away.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the call is new
    /// * `Ok(false)` if the same call is already pending; nothing changes
    /// * `Err(ElevatorError::InvalidLevel)` if the level is out of bounds
    /// * `Err(ElevatorError::DispatcherShutDown)` after `shutdown`
    pub fn request_call(&self, level: Level, direction: CallDirection) -> ElevatorResult<bool> {
        if self.is_shut_down() {
            warn!("Rejected {} call at level {}: dispatcher is shut down", direction, level);
            return Err(ElevatorError::DispatcherShutDown);
        }
        if let Err(e) = self.bounds.check(level) {
            warn!("Rejected {} call: {}", direction, e);
            return Err(e);
        }

        if !self.pending.mark_waiting(level, direction) {
            debug!("{} call at level {} is already pending", direction, level);
            return Ok(false);
        }
        info!("New {} call at level {}", direction, level);
        self.dispatch_pending();
        Ok(true)
    }

    /// Runs one assignment pass over every waiting call.
    ///
    /// Choosing units and claiming calls in the table happens under the pass guard; the chosen units
    /// are only called after it is released, so a unit observer may call back into the dispatcher.
    /// A call whose unit refuses it goes back to waiting.
    ///
    /// # Returns
    ///
    /// The number of calls assigned in this pass.
    pub fn dispatch_pending(&self) -> usize {
        self.recover_stalled();

        let units: Vec<Arc<TransportUnit>> = self.units()
            .into_iter()
            .filter(|unit| !unit.is_shut_down())
            .collect();
        let snapshots: Vec<UnitSnapshot> = units.iter().map(|unit| unit.snapshot()).collect();

        let plan = {
            let _pass = self.pass_guard.lock();
            self.claim_calls(snapshots)
        };

        let mut assigned = 0;
        for (level, direction, selection) in plan {
            let Some(unit) = units.iter().find(|unit| unit.id() == selection.unit_id) else {
                continue;
            };
            match unit.assign_external_request(level, direction) {
                Ok(_) => {
                    unit.resume();
                    info!(
                        "Assigned {} call at level {} to unit {} ({}, distance {})",
                        direction, level, unit.id(), selection.tier, selection.cost
                    );
                    assigned += 1;
                }
                Err(e) => {
                    self.pending.revert_to_waiting(level, direction);
                    warn!("Could not assign {} call at level {} to unit {}: {}", direction, level, unit.id(), e);
                }
            }
        }
        assigned
    }

    /// Picks a unit for every waiting call and marks the call assigned to it.
    ///
    /// Each choice is folded into the chosen unit's snapshot so that later calls in the same pass
    /// see the unit's new pickup and direction.
    fn claim_calls(&self, mut snapshots: Vec<UnitSnapshot>) -> Vec<(Level, CallDirection, Selection)> {
        let mut plan = Vec::new();
        for (level, direction) in self.pending.waiting() {
            let selection = match select_unit(&snapshots, level, direction) {
                Ok(selection) => selection,
                Err(e) => {
                    debug!("{}, call stays pending", e);
                    continue;
                }
            };
            if !self.pending.mark_assigned(level, direction, selection.unit_id) {
                continue;
            }
            if let Some(snapshot) = snapshots.iter_mut().find(|snapshot| snapshot.unit_id == selection.unit_id) {
                fold_pickup(snapshot, level, direction);
            }
            plan.push((level, direction, selection));
        }
        plan
    }

    /// Returns to the waiting state every assigned call held by a unit that is full and has
    /// nowhere to take its passengers, withdrawing the pickup from that unit.
    ///
    /// # Returns
    ///
    /// The number of calls released.
    fn recover_stalled(&self) -> usize {
        let mut released = 0;
        for (level, direction, unit_id) in self.pending.assigned() {
            let Ok(unit) = self.unit(unit_id) else {
                self.pending.revert_to_waiting(level, direction);
                released += 1;
                continue;
            };

            let snapshot = unit.snapshot();
            let stalled = unit.is_shut_down() || (snapshot.is_full() && snapshot.internal_requests.is_empty());
            if stalled && unit.withdraw_external_request(level, direction) {
                self.pending.revert_to_waiting(level, direction);
                warn!("Unit {} is stalled, {} call at level {} returned to waiting", unit_id, direction, level);
                released += 1;
            }
        }
        released
    }

    /// Subscribes an observer to the events of every registered unit.
    pub fn add_system_observer(&self, observer: Arc<dyn UnitObserver>) -> ObserverId {
        self.system_observers.subscribe(observer)
    }

    pub fn remove_system_observer(&self, id: ObserverId) -> bool {
        self.system_observers.unsubscribe(id)
    }

    /// A sorted copy of the pending call table.
    pub fn pending_calls(&self) -> Vec<(Level, PendingCall)> {
        self.pending.snapshot()
    }

    pub fn pending_call(&self, level: Level) -> Option<PendingCall> {
        self.pending.get(level)
    }

    pub fn call_status(&self, level: Level, direction: CallDirection) -> Option<CallStatus> {
        self.pending.status(level, direction)
    }

    /// The number of levels with at least one pending call.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.is_shutdown_triggered()
    }

    /// Stops the background tasks and every registered unit, waiting up to the configured grace
    /// period for each before aborting it.
    ///
    /// # Returns
    ///
    /// The number of tasks that had to be aborted.
    pub async fn shutdown(&self) -> usize {
        if !self.lifecycle.trigger_shutdown() {
            debug!("Dispatcher shutdown already in progress");
        }
        info!("Shutting down dispatcher");

        for unit in self.units() {
            unit.shutdown();
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        join_with_grace(tasks, self.shutdown_grace).await
    }
}

/// Applies a new pickup to a snapshot the way the unit itself would record it.
fn fold_pickup(snapshot: &mut UnitSnapshot, level: Level, direction: CallDirection) {
    let mut requests = RequestSets::new();
    for &internal in &snapshot.internal_requests {
        requests.add_internal(internal);
    }
    for &pickup in &snapshot.external_up {
        requests.add_pickup(pickup, CallDirection::Up);
    }
    for &pickup in &snapshot.external_down {
        requests.add_pickup(pickup, CallDirection::Down);
    }
    requests.add_pickup(level, direction);

    if snapshot.direction == Direction::Idle && snapshot.run_state == RunState::Stopped {
        snapshot.direction = requests.next_direction(snapshot.level, Direction::Idle, false);
    }
    snapshot.external_up = requests.pickups(CallDirection::Up).iter().copied().collect();
    snapshot.external_down = requests.pickups(CallDirection::Down).iter().copied().collect();
}

//! # Transport Unit
//!
//! A `TransportUnit` is one elevator car. It owns its physical state and request sets behind a
//! single `parking_lot::Mutex`, and runs its own control loop as a tokio task started with
//! [`TransportUnit::start`].
//!
//! The lock is only held for short, synchronous steps. Door and travel delays, parking, and
//! observer notification all happen with the lock released, so requests can be added while the
//! unit is moving.

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::config::TimingSettings;
use crate::controllers::request_sets::RequestSets;
use crate::errors::{ElevatorError, ElevatorResult};
use crate::event_handling::observer::{ObserverId, ObserverRegistry, UnitObserver};
use crate::models::{
    local_now, ArrivalEvent, CallDirection, Direction, DirectionChangedEvent, DoorsEvent, Level,
    LevelBounds, RunState, UnitEvent, UnitSnapshot,
};
use crate::state_management::Lifecycle;

/// The mutable part of a unit, guarded by the unit's lock.
#[derive(Debug)]
struct UnitState {
    level: Level,
    direction: Direction,
    run_state: RunState,
    occupancy: u32,
    requests: RequestSets,
    /// Level at which a pickup was deferred because the unit was full. Pickups there are ignored
    /// by the stop and direction decisions until the unit moves or someone gets off.
    deferred_at: Option<Level>,
}

impl UnitState {
    fn pickups_blocked(&self) -> bool {
        self.deferred_at == Some(self.level)
    }

    /// Whether the loop has anything it can act on. A full unit cannot act on pickups alone.
    fn has_serviceable_work(&self, capacity: u32) -> bool {
        !self.requests.internal().is_empty() || (self.requests.has_pickups() && self.occupancy < capacity)
    }
}

/// The door and travel delays of one unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitTiming {
    pub door_open: Duration,
    pub door_close: Duration,
    pub travel: Duration,
}

impl From<&TimingSettings> for UnitTiming {
    fn from(timing: &TimingSettings) -> Self {
        Self {
            door_open: timing.door_open(),
            door_close: timing.door_close(),
            travel: timing.travel(),
        }
    }
}

/// What the loop decided to do after a stop check.
enum Step {
    Park,
    Stop(Level),
    Move,
    Reevaluate,
}

pub struct TransportUnit {
    id: u32,
    capacity: u32,
    bounds: LevelBounds,
    timing: UnitTiming,
    state: Mutex<UnitState>,
    wake: Notify,
    lifecycle: Lifecycle,
    observers: ObserverRegistry,
}

impl TransportUnit {
    /// Creates a unit parked at `start_level` with its doors closed and nobody on board.
    ///
    /// # Returns
    ///
    /// * `Err(ElevatorError::InvalidLevel)` if `start_level` is out of bounds
    /// * `Err(ElevatorError::ConfigError)` if `capacity` is zero
    pub fn new(id: u32, capacity: u32, start_level: Level, bounds: LevelBounds, timing: UnitTiming) -> ElevatorResult<Self> {
        bounds.check(start_level)?;
        if capacity == 0 {
            return Err(ElevatorError::ConfigError(format!("Unit {} needs a capacity of at least 1", id)));
        }
        Ok(Self {
            id,
            capacity,
            bounds,
            timing,
            state: Mutex::new(UnitState {
                level: start_level,
                direction: Direction::Idle,
                run_state: RunState::Stopped,
                occupancy: 0,
                requests: RequestSets::new(),
                deferred_at: None,
            }),
            wake: Notify::new(),
            lifecycle: Lifecycle::new(),
            observers: ObserverRegistry::new(),
        })
    }

    /// Spawns the control loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let unit = Arc::clone(self);
        tokio::spawn(async move { unit.run().await })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn level(&self) -> Level {
        self.state.lock().level
    }

    pub fn direction(&self) -> Direction {
        self.state.lock().direction
    }

    pub fn run_state(&self) -> RunState {
        self.state.lock().run_state
    }

    pub fn occupancy(&self) -> u32 {
        self.state.lock().occupancy
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().occupancy >= self.capacity
    }

    /// A copy of the internal destinations, ascending.
    pub fn internal_requests(&self) -> Vec<Level> {
        self.state.lock().requests.internal().iter().copied().collect()
    }

    /// A copy of the assigned pickups for `direction`, ascending.
    pub fn external_requests(&self, direction: CallDirection) -> Vec<Level> {
        self.state.lock().requests.pickups(direction).iter().copied().collect()
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        let state = self.state.lock();
        self.snapshot_of(&state)
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.is_shutdown_triggered()
    }

    pub fn subscribe(&self, observer: Arc<dyn UnitObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Records a destination chosen from inside the car.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the destination was recorded
    /// * `Ok(false)` if it was already pending
    /// * `Err(ElevatorError::InvalidLevel)` if the level is out of bounds; nothing is changed
    /// * `Err(ElevatorError::UnitShutDown)` after `shutdown`
    pub fn add_internal_request(&self, level: Level) -> ElevatorResult<bool> {
        self.accept(level, "internal request")?;
        self.record(level, "internal request", |requests| requests.add_internal(level))
    }

    /// Assigns a floor call to this unit. Called by the dispatcher.
    ///
    /// Same contract as [`TransportUnit::add_internal_request`].
    pub fn assign_external_request(&self, level: Level, direction: CallDirection) -> ElevatorResult<bool> {
        self.accept(level, "external assignment")?;
        self.record(level, "external assignment", |requests| requests.add_pickup(level, direction))
    }

    /// Takes back an assigned pickup that has not been served yet.
    ///
    /// Returns `false` if the unit did not hold it.
    pub fn withdraw_external_request(&self, level: Level, direction: CallDirection) -> bool {
        let (removed, snapshot) = {
            let mut state = self.state.lock();
            let removed = state.requests.remove_pickup(level, direction);
            (removed, self.snapshot_of(&state))
        };
        if removed {
            info!("Unit {}: Withdrew {} pickup at level {}", self.id, direction, level);
            self.observers.publish(&UnitEvent::StatusUpdate(snapshot));
        }
        removed
    }

    /// Wakes a parked control loop.
    pub fn resume(&self) {
        self.wake.notify_one();
    }

    /// Stops the control loop. Requests are rejected from now on.
    pub fn shutdown(&self) {
        if self.lifecycle.trigger_shutdown() {
            info!("Unit {}: Shutting down", self.id);
        }
        self.wake.notify_one();
    }

    fn accept(&self, level: Level, what: &str) -> ElevatorResult<Level> {
        if self.is_shut_down() {
            warn!("Unit {}: Rejected {} for level {}: unit is shut down", self.id, what, level);
            return Err(ElevatorError::UnitShutDown(self.id));
        }
        self.bounds.check(level).map_err(|e| {
            warn!("Unit {}: Rejected {}: {}", self.id, what, e);
            e
        })
    }

    fn record(&self, level: Level, what: &str, insert: impl FnOnce(&mut RequestSets) -> bool) -> ElevatorResult<bool> {
        let mut events = Vec::new();
        let added = {
            let mut state = self.state.lock();
            let added = insert(&mut state.requests);
            if added {
                // A unit standing with its doors open keeps the direction it announced for this stop
                if state.direction == Direction::Idle && state.run_state == RunState::Stopped {
                    let next = state.requests.next_direction(state.level, Direction::Idle, state.pickups_blocked());
                    self.change_direction(&mut state, next, &mut events);
                }
                events.push(UnitEvent::StatusUpdate(self.snapshot_of(&state)));
            }
            added
        };

        if added {
            info!("Unit {}: Added {} for level {}", self.id, what, level);
            self.observers.publish_all(&events);
            self.wake.notify_one();
        } else {
            debug!("Unit {}: {} for level {} already pending", self.id, what, level);
        }
        Ok(added)
    }

    fn snapshot_of(&self, state: &UnitState) -> UnitSnapshot {
        UnitSnapshot {
            unit_id: self.id,
            level: state.level,
            direction: state.direction,
            run_state: state.run_state,
            occupancy: state.occupancy,
            capacity: self.capacity,
            internal_requests: state.requests.internal().iter().copied().collect(),
            external_up: state.requests.pickups(CallDirection::Up).iter().copied().collect(),
            external_down: state.requests.pickups(CallDirection::Down).iter().copied().collect(),
        }
    }

    fn change_direction(&self, state: &mut UnitState, next: Direction, events: &mut Vec<UnitEvent>) {
        if state.direction == next {
            return;
        }
        let old = state.direction;
        state.direction = next;
        info!("Unit {}: Direction changed from {} to {} at level {}", self.id, old, next, state.level);
        events.push(UnitEvent::DirectionChanged(DirectionChangedEvent {
            unit_id: self.id,
            level: state.level,
            old_direction: old,
            new_direction: next,
            timestamp: local_now(),
        }));
    }

    /// The control loop. Runs until `shutdown` is called.
    async fn run(self: Arc<Self>) {
        info!("Unit {}: Control loop started at level {}", self.id, self.level());
        while !self.lifecycle.is_shutdown_triggered() {
            let mut events = Vec::new();
            let step = self.decide(&mut events);
            self.observers.publish_all(&events);

            let completed = match step {
                Step::Park => self.park().await,
                Step::Stop(level) => self.serve_stop(level).await,
                Step::Move => self.move_one_level().await,
                Step::Reevaluate => {
                    tokio::task::yield_now().await;
                    true
                }
            };
            if !completed {
                break;
            }
        }
        self.state.lock().run_state = RunState::Stopped;
        info!("Unit {}: Control loop stopped", self.id);
    }

    /// One locked decision: park, stop here, move on, or re-evaluate after a reversal.
    fn decide(&self, events: &mut Vec<UnitEvent>) -> Step {
        let mut state = self.state.lock();

        if !state.has_serviceable_work(self.capacity) {
            self.change_direction(&mut state, Direction::Idle, events);
            state.run_state = RunState::Stopped;
            return Step::Park;
        }

        let next = state.requests.next_direction(state.level, state.direction, state.pickups_blocked());
        self.change_direction(&mut state, next, events);

        if state.requests.should_stop(state.level, state.direction, state.pickups_blocked()) {
            return Step::Stop(state.level);
        }
        if state.requests.ahead(state.level, state.direction) {
            return Step::Move;
        }
        state.run_state = RunState::Stopped;
        Step::Reevaluate
    }

    /// Waits for `resume`, a new request, or shutdown. Returns `false` on shutdown.
    async fn park(&self) -> bool {
        debug!("Unit {}: Parked at level {}", self.id, self.level());
        tokio::select! {
            _ = self.wake.notified() => true,
            _ = self.lifecycle.wait_for_shutdown() => false,
        }
    }

    /// Opens the doors, drops off and picks up, then closes the doors. Returns `false` on shutdown.
    async fn serve_stop(&self, level: Level) -> bool {
        let (opened, pickup) = {
            let mut state = self.state.lock();
            state.run_state = RunState::DoorsOpen;
            let pickup = state.requests.pickup_direction(level, state.direction);
            let serving = pickup.filter(|_| state.occupancy < self.capacity);
            (DoorsEvent { unit_id: self.id, level, serving, timestamp: local_now() }, pickup)
        };
        info!("Unit {}: Doors opening at level {}", self.id, level);
        self.observers.publish(&UnitEvent::DoorsOpen(opened.clone()));

        if !self.lifecycle.sleep(self.timing.door_open).await {
            return false;
        }

        let arrival = self.exchange_passengers(level, pickup);
        self.observers.publish(&UnitEvent::Arrival(arrival));

        info!("Unit {}: Doors closing at level {}", self.id, level);
        self.observers.publish(&UnitEvent::DoorsClose(DoorsEvent { timestamp: local_now(), ..opened }));
        if !self.lifecycle.sleep(self.timing.door_close).await {
            return false;
        }
        self.state.lock().run_state = RunState::Stopped;
        true
    }

    /// Drops off anyone bound for `level`, then picks up the call chosen when the doors opened if
    /// there is room.
    fn exchange_passengers(&self, level: Level, pickup: Option<CallDirection>) -> ArrivalEvent {
        let mut state = self.state.lock();

        if state.requests.remove_internal(level) {
            state.occupancy = state.occupancy.saturating_sub(1);
            state.deferred_at = None;
            info!("Unit {}: Dropped off passenger at level {}", self.id, level);
        }

        let mut served = None;
        let mut deferred = None;
        if let Some(direction) = pickup.filter(|direction| state.requests.has_pickup(level, *direction)) {
            if state.occupancy < self.capacity {
                state.requests.remove_pickup(level, direction);
                state.occupancy += 1;
                state.deferred_at = None;
                served = Some(direction);
                info!("Unit {}: Picked up {} call at level {}", self.id, direction, level);
            } else {
                state.deferred_at = Some(level);
                deferred = Some(direction);
                let e = ElevatorError::CapacityExceeded { unit_id: self.id, level };
                info!("Unit {}: {}", self.id, e);
            }
        }

        ArrivalEvent {
            unit_id: self.id,
            level,
            served,
            deferred,
            snapshot: self.snapshot_of(&state),
            timestamp: local_now(),
        }
    }

    /// Moves one level in the current direction and waits out the travel time. Returns `false` on shutdown.
    async fn move_one_level(&self) -> bool {
        let snapshot = {
            let mut state = self.state.lock();
            let next = match state.direction {
                Direction::Up => state.level + 1,
                Direction::Down => state.level - 1,
                Direction::Idle => return true,
            };
            if !self.bounds.contains(next) {
                warn!("Unit {}: Refusing to move past level {}", self.id, state.level);
                return true;
            }
            state.level = next;
            state.run_state = RunState::Moving;
            state.deferred_at = None;
            self.snapshot_of(&state)
        };
        debug!("Unit {}: Moving {} to level {}", self.id, snapshot.direction, snapshot.level);
        self.observers.publish(&UnitEvent::StatusUpdate(snapshot));
        self.lifecycle.sleep(self.timing.travel).await
    }
}

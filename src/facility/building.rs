//! # Facility
//!
//! The composition root: one dispatcher, the floors of the building, and the units created by
//! [`Facility::setup`]. Floor buttons feed calls to the dispatcher; door-open and arrival events
//! coming back through the dispatcher's system observers turn the buttons off again.

use std::sync::Arc;
use tracing::{info, warn};
use crate::config::Settings;
use crate::controllers::{TransportUnit, UnitFactory, UnitTiming};
use crate::dispatch::Dispatcher;
use crate::errors::ElevatorResult;
use crate::facility::floor::{Floor, FloorButtonObserver, FloorRegistry, FloorStatus};
use crate::models::{CallDirection, Level, LevelBounds, RunState, UnitSnapshot};

pub struct Facility {
    settings: Arc<Settings>,
    bounds: LevelBounds,
    floors: Arc<FloorRegistry>,
    dispatcher: Arc<Dispatcher>,
    factory: UnitFactory,
}

impl Facility {
    /// Builds the floors and starts the dispatcher. Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Err(ElevatorError::ConfigError)` if the settings do not validate
    pub fn new(settings: Settings) -> ElevatorResult<Self> {
        settings.validate()?;
        let bounds = settings.level_bounds()?;

        let floors = Arc::new(FloorRegistry::new(bounds));
        let dispatcher = Arc::new(Dispatcher::new(bounds, &settings.timing));
        dispatcher.add_system_observer(Arc::new(FloorButtonObserver::new(Arc::clone(&floors))));
        dispatcher.start();

        let factory = UnitFactory::new(bounds, UnitTiming::from(&settings.timing));
        info!("Facility ready with levels {} to {}", bounds.min(), bounds.max());

        Ok(Self {
            settings: Arc::new(settings),
            bounds,
            floors,
            dispatcher,
            factory,
        })
    }

    /// Creates `unit_count` units of the given capacity and registers them with the dispatcher.
    ///
    /// # Returns
    ///
    /// The ids of the new units, in registration order.
    pub fn setup(&self, unit_count: usize, capacity: u32) -> ElevatorResult<Vec<u32>> {
        let mut ids = Vec::with_capacity(unit_count);
        for _ in 0..unit_count {
            let unit = self.factory.create(capacity)?;
            ids.push(unit.id());
            self.dispatcher.add_unit(unit)?;
        }
        info!("Facility set up with {} unit(s) of capacity {}", unit_count, capacity);
        Ok(ids)
    }

    /// Presses the up button at `level` and passes the call to the dispatcher.
    ///
    /// Pressing a lit button again still reaches the dispatcher, which ignores calls it already holds.
    pub fn floor_press_up(&self, level: Level) -> ElevatorResult<bool> {
        self.floor_press(level, CallDirection::Up)
    }

    pub fn floor_press_down(&self, level: Level) -> ElevatorResult<bool> {
        self.floor_press(level, CallDirection::Down)
    }

    fn floor_press(&self, level: Level, direction: CallDirection) -> ElevatorResult<bool> {
        let floor = self.floors.get(level).map_err(|e| {
            warn!("Rejected {} button press: {}", direction, e);
            e
        })?;
        if floor.press(direction) {
            info!("{} button pressed at level {}", direction, level);
        }
        self.dispatcher.request_call(level, direction)
    }

    pub fn floor(&self, level: Level) -> ElevatorResult<Arc<Floor>> {
        self.floors.get(level)
    }

    /// Floors with at least one lit button.
    pub fn lit_floors(&self) -> Vec<FloorStatus> {
        self.floors.lit()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn unit(&self, unit_id: u32) -> ElevatorResult<Arc<TransportUnit>> {
        self.dispatcher.unit(unit_id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> LevelBounds {
        self.bounds
    }

    /// A snapshot of every unit in registration order.
    pub fn fleet_status(&self) -> Vec<UnitSnapshot> {
        self.dispatcher.units().iter().map(|unit| unit.snapshot()).collect()
    }

    /// Whether every unit is stopped with nothing to do, no call is pending and no button is lit.
    pub fn is_quiescent(&self) -> bool {
        self.dispatcher.pending_count() == 0
            && self.floors.lit().is_empty()
            && self.fleet_status()
                .iter()
                .all(|unit| !unit.has_requests() && unit.run_state == RunState::Stopped)
    }

    /// Shuts down the dispatcher and every unit.
    ///
    /// # Returns
    ///
    /// The number of tasks that had to be aborted after the grace period.
    pub async fn shutdown(&self) -> usize {
        info!("Shutting down facility");
        let aborted = self.dispatcher.shutdown().await;
        if aborted > 0 {
            warn!("{} task(s) aborted during shutdown", aborted);
        }
        aborted
    }
}

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;

use elevator_sim::config::{BuildingSettings, FleetSettings, LoggingSettings, Settings, TimingSettings};
use elevator_sim::controllers::{TransportUnit, UnitTiming};
use elevator_sim::errors::ElevatorResult;
use elevator_sim::event_handling::UnitObserver;
use elevator_sim::models::{Level, LevelBounds, UnitEvent};

pub fn create_mock_settings() -> Settings {
    Settings {
        building: BuildingSettings { min_level: -2, max_level: 10 },
        timing: TimingSettings {
            door_open_ms: 1000,
            door_close_ms: 1000,
            travel_ms: 2000,
            redispatch_interval_ms: 500,
            shutdown_grace_ms: 2000,
        },
        fleet: FleetSettings { unit_count: 2, capacity: 5 },
        logging: LoggingSettings { level: "info".to_string(), path: None, directives: Vec::new() },
    }
}

pub fn create_mock_bounds() -> LevelBounds {
    create_mock_settings().level_bounds().unwrap()
}

pub fn create_mock_timing() -> UnitTiming {
    UnitTiming::from(&create_mock_settings().timing)
}

pub fn create_mock_unit(id: u32, capacity: u32, start_level: Level) -> Arc<TransportUnit> {
    Arc::new(TransportUnit::new(id, capacity, start_level, create_mock_bounds(), create_mock_timing()).unwrap())
}

/// Polls `condition` every 50ms of virtual time until it holds, panicking after `limit`.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) {
    let step = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while !condition() {
        assert!(waited < limit, "condition not met within {:?}", limit);
        tokio::time::sleep(step).await;
        waited += step;
    }
}

/// Runs `future` to completion within `limit` of virtual time.
pub async fn within<F: Future>(limit: Duration, future: F) -> F::Output {
    tokio::time::timeout(limit, future).await.expect("timed out")
}

/// Records every event it receives.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<UnitEvent>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<UnitEvent> {
        self.events.lock().clone()
    }

    pub fn arrivals(&self) -> Vec<elevator_sim::models::ArrivalEvent> {
        self.events().into_iter()
            .filter_map(|event| match event {
                UnitEvent::Arrival(arrival) => Some(arrival),
                _ => None,
            })
            .collect()
    }
}

impl UnitObserver for EventLog {
    fn name(&self) -> &str {
        "event-log"
    }

    fn handle(&self, event: &UnitEvent) -> ElevatorResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

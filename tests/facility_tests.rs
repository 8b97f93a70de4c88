mod common;

use std::time::Duration;
use elevator_sim::config::Settings;
use elevator_sim::errors::ElevatorError;
use elevator_sim::facility::{Facility, Floor};
use elevator_sim::models::{Direction, RunState};
use common::{create_mock_settings, wait_until};

const LIMIT: Duration = Duration::from_secs(120);

#[test]
fn test_floor_buttons_are_idempotent() {
    let floor = Floor::new(3);

    assert!(floor.press_up());
    assert!(!floor.press_up());
    assert!(floor.has_up_request());
    assert!(!floor.has_down_request());

    assert!(floor.clear_up());
    assert!(!floor.clear_up());
    assert!(!floor.clear_down());
}

#[test]
fn test_default_settings_validate() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());

    let bounds = settings.level_bounds().unwrap();
    assert_eq!((bounds.min(), bounds.max()), (-2, 10));
    assert_eq!(settings.timing.travel(), Duration::from_secs(2));
    assert_eq!(settings.timing.redispatch_interval(), Duration::from_millis(500));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let mut settings = create_mock_settings();
    settings.building.min_level = 4;
    settings.building.max_level = 2;
    assert!(matches!(settings.validate(), Err(ElevatorError::ConfigError(_))));

    let mut settings = create_mock_settings();
    settings.fleet.capacity = 0;
    assert!(settings.validate().is_err());

    let mut settings = create_mock_settings();
    settings.timing.redispatch_interval_ms = 0;
    assert!(settings.validate().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_setup_assigns_sequential_ids() {
    let facility = Facility::new(create_mock_settings()).unwrap();

    assert_eq!(facility.setup(2, 5).unwrap(), vec![1, 2]);
    assert_eq!(facility.setup(1, 3).unwrap(), vec![3]);

    let status = facility.fleet_status();
    assert_eq!(status.len(), 3);
    assert!(status.iter().all(|unit| unit.level == 0 && unit.direction == Direction::Idle));
    assert_eq!(status[2].capacity, 3);
    assert!(facility.is_quiescent());

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_floor_button_is_cleared_when_served() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(2, 5).unwrap();

    assert!(facility.floor_press_up(2).unwrap());
    assert!(!facility.floor_press_up(2).unwrap());
    let floor = facility.floor(2).unwrap();
    assert!(floor.has_up_request());
    assert_eq!(facility.lit_floors().len(), 1);

    wait_until(LIMIT, || !floor.has_up_request()).await;
    wait_until(LIMIT, || facility.dispatcher().pending_count() == 0).await;
    let unit = facility.unit(1).unwrap();
    assert_eq!(unit.level(), 2);
    assert_eq!(unit.occupancy(), 1);

    unit.add_internal_request(5).unwrap();
    wait_until(LIMIT, || facility.is_quiescent()).await;
    assert_eq!(unit.level(), 5);
    assert_eq!(unit.occupancy(), 0);

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_press_while_doors_open_does_not_leave_button_lit() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(1, 5).unwrap();
    let unit = facility.unit(1).unwrap();
    let floor = facility.floor(0).unwrap();

    assert!(facility.floor_press_up(0).unwrap());
    wait_until(LIMIT, || unit.run_state() == RunState::DoorsOpen && !floor.has_up_request()).await;

    // The call is still pending until the pickup completes, so this press is absorbed by it
    assert!(!facility.floor_press_up(0).unwrap());
    assert!(floor.has_up_request());

    wait_until(LIMIT, || facility.is_quiescent()).await;
    assert!(!floor.has_up_request());
    assert!(facility.lit_floors().is_empty());
    assert_eq!(facility.dispatcher().pending_count(), 0);
    assert_eq!(unit.occupancy(), 1);

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_up_and_down_calls_at_same_level_are_both_served() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(2, 5).unwrap();

    facility.floor_press_up(4).unwrap();
    facility.floor_press_down(4).unwrap();

    wait_until(LIMIT, || facility.is_quiescent()).await;
    let floor = facility.floor(4).unwrap();
    assert!(!floor.has_up_request());
    assert!(!floor.has_down_request());

    let riders: u32 = facility.fleet_status().iter().map(|unit| unit.occupancy).sum();
    assert_eq!(riders, 2);

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_press_is_rejected() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(1, 5).unwrap();

    assert!(matches!(facility.floor_press_down(11), Err(ElevatorError::InvalidLevel { .. })));
    assert!(facility.floor(-3).is_err());
    assert!(facility.lit_floors().is_empty());
    assert_eq!(facility.dispatcher().pending_count(), 0);

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_fleet_status_serialises() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(1, 5).unwrap();
    facility.floor_press_down(-1).unwrap();

    let json = serde_json::to_value(facility.fleet_status()).unwrap();
    assert_eq!(json[0]["unit_id"], 1);
    assert_eq!(json[0]["direction"], "Down");
    assert_eq!(json[0]["external_down"], serde_json::json!([-1]));

    facility.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_graceful() {
    let facility = Facility::new(create_mock_settings()).unwrap();
    facility.setup(2, 5).unwrap();
    facility.floor_press_up(7).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(facility.shutdown().await, 0);
    assert!(matches!(facility.floor_press_up(1), Err(ElevatorError::DispatcherShutDown)));
    assert!(facility.fleet_status().iter().all(|unit| unit.level < 7));
}

mod common;

use std::time::Duration;
use elevator_sim::errors::ElevatorError;
use elevator_sim::event_handling::FnObserver;
use elevator_sim::models::{CallDirection, Direction, RunState, UnitEvent};
use std::sync::Arc;
use common::{create_mock_unit, wait_until, within, EventLog};

const LIMIT: Duration = Duration::from_secs(120);

#[tokio::test(start_paused = true)]
async fn test_internal_request_is_served() {
    let unit = create_mock_unit(1, 5, 0);
    let log = EventLog::new();
    unit.subscribe(log.clone());
    let handle = unit.start();

    assert_eq!(unit.add_internal_request(5).unwrap(), true);
    assert_eq!(unit.direction(), Direction::Up);

    wait_until(LIMIT, || unit.level() == 5 && unit.internal_requests().is_empty()).await;
    wait_until(LIMIT, || unit.direction() == Direction::Idle && unit.run_state() == RunState::Stopped).await;
    assert_eq!(unit.occupancy(), 0);

    let arrivals = log.arrivals();
    assert_eq!(arrivals.len(), 1);
    assert_eq!(arrivals[0].level, 5);
    assert_eq!(arrivals[0].served, None);

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_out_of_bounds_requests_are_rejected() {
    let unit = create_mock_unit(1, 5, 0);

    let result = unit.add_internal_request(-5);
    assert!(matches!(result, Err(ElevatorError::InvalidLevel { level: -5, min: -2, max: 10 })));
    assert!(unit.assign_external_request(11, CallDirection::Down).is_err());

    let snapshot = unit.snapshot();
    assert!(!snapshot.has_requests());
    assert_eq!(snapshot.direction, Direction::Idle);
    assert_eq!(snapshot.level, 0);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_internal_request_is_a_no_op() {
    let unit = create_mock_unit(1, 5, 0);

    assert!(unit.add_internal_request(3).unwrap());
    assert!(!unit.add_internal_request(3).unwrap());
    assert_eq!(unit.internal_requests(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_pickup_then_drop_off() {
    let unit = create_mock_unit(1, 5, 0);
    let handle = unit.start();

    unit.assign_external_request(3, CallDirection::Up).unwrap();
    wait_until(LIMIT, || unit.occupancy() == 1).await;
    assert_eq!(unit.level(), 3);
    assert!(unit.external_requests(CallDirection::Up).is_empty());

    unit.add_internal_request(6).unwrap();
    wait_until(LIMIT, || unit.level() == 6 && unit.occupancy() == 0).await;

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_idle_unit_serves_call_at_its_own_level() {
    let unit = create_mock_unit(1, 5, 0);
    let handle = unit.start();

    unit.assign_external_request(0, CallDirection::Down).unwrap();
    wait_until(LIMIT, || unit.occupancy() == 1).await;
    assert_eq!(unit.level(), 0);
    assert!(unit.external_requests(CallDirection::Down).is_empty());

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_direction_is_monotonic_while_moving() {
    let unit = create_mock_unit(1, 5, 0);
    let log = EventLog::new();
    unit.subscribe(log.clone());
    let handle = unit.start();

    unit.add_internal_request(8).unwrap();
    unit.add_internal_request(-2).unwrap();
    wait_until(LIMIT, || unit.internal_requests().is_empty() && unit.direction() == Direction::Idle).await;

    let mut last_level = 0;
    let mut direction = Direction::Idle;
    let mut changes = Vec::new();
    for event in log.events() {
        match event {
            UnitEvent::DirectionChanged(change) => {
                direction = change.new_direction;
                changes.push(change.new_direction);
            }
            UnitEvent::StatusUpdate(snapshot) => {
                match direction {
                    Direction::Up => assert!(snapshot.level >= last_level),
                    Direction::Down => assert!(snapshot.level <= last_level),
                    Direction::Idle => {}
                }
                last_level = snapshot.level;
            }
            _ => {}
        }
    }
    assert_eq!(changes, vec![Direction::Up, Direction::Down, Direction::Idle]);
    assert_eq!(unit.level(), -2);

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_full_unit_defers_pickup() {
    let unit = create_mock_unit(1, 1, 0);
    let log = EventLog::new();
    unit.subscribe(log.clone());
    let handle = unit.start();

    unit.assign_external_request(2, CallDirection::Up).unwrap();
    unit.assign_external_request(4, CallDirection::Up).unwrap();
    unit.add_internal_request(6).unwrap();

    wait_until(LIMIT, || log.arrivals().iter().any(|a| a.level == 4)).await;
    let deferred = log.arrivals().into_iter().find(|a| a.level == 4).unwrap();
    assert_eq!(deferred.served, None);
    assert_eq!(deferred.deferred, Some(CallDirection::Up));
    assert_eq!(deferred.snapshot.occupancy, 1);
    assert!(deferred.snapshot.has_pickup(4, CallDirection::Up));

    // Once the passenger leaves at 6 the unit comes back for the deferred pickup
    wait_until(LIMIT, || unit.external_requests(CallDirection::Up).is_empty()).await;
    assert_eq!(unit.level(), 4);
    assert_eq!(unit.occupancy(), 1);
    assert!(log.arrivals().iter().all(|a| a.snapshot.occupancy <= 1));

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failing_observers_do_not_stop_the_loop() {
    let unit = create_mock_unit(1, 5, 0);
    unit.subscribe(Arc::new(FnObserver::new("panics", |_event: &UnitEvent| -> elevator_sim::errors::ElevatorResult<()> {
        panic!("observer failure")
    })));
    unit.subscribe(Arc::new(FnObserver::new("errors", |_event: &UnitEvent| {
        Err(ElevatorError::ObserverError("rejected".to_string()))
    })));
    let log = EventLog::new();
    unit.subscribe(log.clone());
    let handle = unit.start();

    unit.add_internal_request(2).unwrap();
    wait_until(LIMIT, || unit.level() == 2 && unit.internal_requests().is_empty()).await;
    assert_eq!(log.arrivals().len(), 1);

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_removed_observer_receives_nothing() {
    let unit = create_mock_unit(1, 5, 0);
    let log = EventLog::new();
    let id = unit.subscribe(log.clone());

    assert!(unit.remove_observer(id));
    assert!(!unit.remove_observer(id));
    unit.add_internal_request(1).unwrap();
    assert!(log.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_requests_and_stops_parked_loop() {
    let unit = create_mock_unit(1, 5, 0);
    let handle = unit.start();
    tokio::task::yield_now().await;

    unit.shutdown();
    within(Duration::from_secs(1), handle).await.unwrap();
    assert!(matches!(unit.add_internal_request(3), Err(ElevatorError::UnitShutDown(1))));
    assert!(unit.internal_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_travel() {
    let unit = create_mock_unit(1, 5, 0);
    let handle = unit.start();

    unit.add_internal_request(10).unwrap();
    wait_until(LIMIT, || unit.run_state() == RunState::Moving).await;
    unit.shutdown();

    within(Duration::from_millis(100), handle).await.unwrap();
    assert!(unit.level() < 10);
}

#[tokio::test(start_paused = true)]
async fn test_request_during_stop_keeps_announced_pickup() {
    let unit = create_mock_unit(1, 5, 0);
    let log = EventLog::new();
    unit.subscribe(log.clone());
    let handle = unit.start();

    unit.assign_external_request(0, CallDirection::Up).unwrap();
    wait_until(LIMIT, || unit.run_state() == RunState::DoorsOpen).await;
    let announced = unit.direction();

    // A passenger already inside picks a level below while the doors are open
    assert!(unit.add_internal_request(-2).unwrap());
    assert_eq!(unit.direction(), announced);

    wait_until(LIMIT, || log.arrivals().iter().any(|a| a.level == 0)).await;
    let opened = log.events().into_iter()
        .find_map(|event| match event {
            UnitEvent::DoorsOpen(doors) if doors.level == 0 => Some(doors),
            _ => None,
        })
        .unwrap();
    let arrival = log.arrivals().into_iter().find(|a| a.level == 0).unwrap();
    assert_eq!(opened.serving, Some(CallDirection::Up));
    assert_eq!(arrival.served, opened.serving);
    assert!(arrival.snapshot.external_up.is_empty());
    assert_eq!(arrival.snapshot.occupancy, 1);

    wait_until(LIMIT, || unit.level() == -2 && unit.internal_requests().is_empty()).await;
    wait_until(LIMIT, || unit.direction() == Direction::Idle && unit.run_state() == RunState::Stopped).await;
    assert!(unit.external_requests(CallDirection::Up).is_empty());
    assert_eq!(unit.occupancy(), 0);

    unit.shutdown();
    within(LIMIT, handle).await.unwrap();
}

use elevator_sim::dispatch::{select_unit, CallStatus, PendingCallTable, ELIGIBILITY_TIERS};
use elevator_sim::errors::ElevatorError;
use elevator_sim::models::{CallDirection, Direction, Level, RunState, UnitSnapshot};

fn create_mock_snapshot(unit_id: u32, level: Level, direction: Direction) -> UnitSnapshot {
    UnitSnapshot {
        unit_id,
        level,
        direction,
        run_state: RunState::Stopped,
        occupancy: 0,
        capacity: 5,
        internal_requests: vec![],
        external_up: vec![],
        external_down: vec![],
    }
}

#[test]
fn test_tie_goes_to_first_registered_unit() {
    let units = vec![
        create_mock_snapshot(1, 0, Direction::Idle),
        create_mock_snapshot(2, 10, Direction::Idle),
    ];

    let selection = select_unit(&units, 5, CallDirection::Up).unwrap();
    assert_eq!(selection.unit_id, 1);
    assert_eq!(selection.tier, "idle");
    assert_eq!(selection.cost, 5);
}

#[test]
fn test_nearest_unit_wins_within_tier() {
    let units = vec![
        create_mock_snapshot(1, -2, Direction::Idle),
        create_mock_snapshot(2, 6, Direction::Idle),
    ];

    assert_eq!(select_unit(&units, 5, CallDirection::Down).unwrap().unit_id, 2);
}

#[test]
fn test_en_route_unit_beats_closer_idle_unit() {
    let units = vec![
        create_mock_snapshot(1, 4, Direction::Idle),
        create_mock_snapshot(2, -2, Direction::Up),
    ];

    let selection = select_unit(&units, 5, CallDirection::Up).unwrap();
    assert_eq!(selection.unit_id, 2);
    assert_eq!(selection.tier, "en-route");
}

#[test]
fn test_unit_past_the_call_is_not_en_route() {
    let units = vec![create_mock_snapshot(1, 4, Direction::Up)];

    let result = select_unit(&units, 3, CallDirection::Up);
    assert!(matches!(result, Err(ElevatorError::NoEligibleUnit { level: 3, direction: CallDirection::Up })));
}

#[test]
fn test_unit_at_call_level_is_en_route() {
    let units = vec![create_mock_snapshot(1, 3, Direction::Down)];

    assert_eq!(select_unit(&units, 3, CallDirection::Down).unwrap().tier, "en-route");
}

#[test]
fn test_opposite_direction_unit_is_never_chosen() {
    let units = vec![create_mock_snapshot(1, 0, Direction::Down)];

    assert!(select_unit(&units, 5, CallDirection::Up).is_err());
    assert!(ELIGIBILITY_TIERS[2].admits(&units[0], 5, CallDirection::Up));
    assert!(!ELIGIBILITY_TIERS[2].selectable);
}

#[test]
fn test_full_units_are_skipped() {
    let mut full = create_mock_snapshot(1, 5, Direction::Idle);
    full.occupancy = 5;
    let units = vec![full, create_mock_snapshot(2, 9, Direction::Idle)];

    assert_eq!(select_unit(&units, 5, CallDirection::Up).unwrap().unit_id, 2);
    assert!(select_unit(&units[..1], 5, CallDirection::Up).is_err());
}

#[test]
fn test_pending_call_lifecycle() {
    let table = PendingCallTable::new();

    assert!(table.mark_waiting(4, CallDirection::Up));
    assert!(!table.mark_waiting(4, CallDirection::Up));
    assert!(table.mark_waiting(4, CallDirection::Down));
    assert_eq!(table.len(), 1);
    assert_eq!(table.waiting(), vec![(4, CallDirection::Up), (4, CallDirection::Down)]);

    assert!(table.mark_assigned(4, CallDirection::Up, 2));
    assert!(!table.mark_assigned(4, CallDirection::Up, 3));
    assert_eq!(table.status(4, CallDirection::Up), Some(CallStatus::Assigned { unit_id: 2 }));
    assert_eq!(table.assigned(), vec![(4, CallDirection::Up, 2)]);

    assert!(table.clear(4, CallDirection::Up));
    assert!(table.get(4).is_some());
    assert!(table.clear(4, CallDirection::Down));
    assert!(table.get(4).is_none());
    assert!(table.is_empty());
    assert!(!table.clear(4, CallDirection::Down));
}

#[test]
fn test_assigned_call_can_return_to_waiting() {
    let table = PendingCallTable::new();
    table.mark_waiting(-1, CallDirection::Up);

    assert!(!table.revert_to_waiting(-1, CallDirection::Up));
    table.mark_assigned(-1, CallDirection::Up, 1);
    assert!(table.revert_to_waiting(-1, CallDirection::Up));
    assert_eq!(table.status(-1, CallDirection::Up), Some(CallStatus::Waiting));
}

#[test]
fn test_pending_snapshot_is_sorted_and_serialisable() {
    let table = PendingCallTable::new();
    table.mark_waiting(7, CallDirection::Down);
    table.mark_waiting(-2, CallDirection::Up);

    let snapshot = table.snapshot();
    let levels: Vec<Level> = snapshot.iter().map(|(level, _)| *level).collect();
    assert_eq!(levels, vec![-2, 7]);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json[0][1]["up"], serde_json::json!("Waiting"));
}

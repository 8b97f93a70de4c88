use serde::{Deserialize, Serialize};
use crate::models::{CallDirection, Direction, Level, RunState};

/// A consistent, read-only copy of one unit's state taken under its lock.
///
/// The dispatcher's cost function and every observer work from snapshots, never from the
/// live unit, so they may be slightly stale by the time they are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub unit_id: u32,
    pub level: Level,
    pub direction: Direction,
    pub run_state: RunState,
    pub occupancy: u32,
    pub capacity: u32,
    /// Internal destinations, ascending.
    pub internal_requests: Vec<Level>,
    /// Assigned up-call pickups, ascending.
    pub external_up: Vec<Level>,
    /// Assigned down-call pickups, ascending.
    pub external_down: Vec<Level>,
}

impl UnitSnapshot {
    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity
    }

    /// Whether the unit still holds a pickup for `level` in `direction`.
    pub fn has_pickup(&self, level: Level, direction: CallDirection) -> bool {
        match direction {
            CallDirection::Up => self.external_up.contains(&level),
            CallDirection::Down => self.external_down.contains(&level),
        }
    }

    pub fn has_requests(&self) -> bool {
        !self.internal_requests.is_empty() || !self.external_up.is_empty() || !self.external_down.is_empty()
    }
}

//! # Travel and Call Directions

use serde::{Deserialize, Serialize};
use derive_more::Display;

/// The direction a unit is travelling in, or `Idle` when it has nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Direction {
    #[display("UP")]
    Up,
    #[display("DOWN")]
    Down,
    #[display("IDLE")]
    Idle,
}

impl Direction {
    /// The direction pointing the other way. `Idle` stays `Idle`.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Idle => Direction::Idle,
        }
    }
}

/// The direction requested by a floor call button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum CallDirection {
    #[display("UP")]
    Up,
    #[display("DOWN")]
    Down,
}

impl CallDirection {
    /// Both call directions, `Up` first. Passes over the pending table use this order.
    pub const ALL: [CallDirection; 2] = [CallDirection::Up, CallDirection::Down];
}

impl From<CallDirection> for Direction {
    fn from(direction: CallDirection) -> Self {
        match direction {
            CallDirection::Up => Direction::Up,
            CallDirection::Down => Direction::Down,
        }
    }
}

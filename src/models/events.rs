//! # Unit Event Definitions
//!
//! This module defines the `UnitEvent` enum and its associated structs, the closed set of notifications a
//! transport unit publishes while running. Observers (the dispatcher, the facility, loggers) subscribe to
//! these; the unit never depends on what a subscriber does with them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::models::{CallDirection, Direction, Level, UnitSnapshot};

/// Represents the different notifications a transport unit can publish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UnitEvent {
    /// The unit stopped at a level and finished its drop-off and pickup
    Arrival(ArrivalEvent),
    /// The unit opened its doors at a level
    DoorsOpen(DoorsEvent),
    /// The unit closed its doors at a level
    DoorsClose(DoorsEvent),
    /// The unit's direction of travel changed
    DirectionChanged(DirectionChangedEvent),
    /// The unit moved or its request sets changed
    StatusUpdate(UnitSnapshot),
}

impl UnitEvent {
    /// Retrieves the id of the unit that published the event
    pub fn unit_id(&self) -> u32 {
        match self {
            UnitEvent::Arrival(e) => e.unit_id,
            UnitEvent::DoorsOpen(e) => e.unit_id,
            UnitEvent::DoorsClose(e) => e.unit_id,
            UnitEvent::DirectionChanged(e) => e.unit_id,
            UnitEvent::StatusUpdate(s) => s.unit_id,
        }
    }

    /// Retrieves the level at which the event happened
    pub fn level(&self) -> Level {
        match self {
            UnitEvent::Arrival(e) => e.level,
            UnitEvent::DoorsOpen(e) => e.level,
            UnitEvent::DoorsClose(e) => e.level,
            UnitEvent::DirectionChanged(e) => e.level,
            UnitEvent::StatusUpdate(s) => s.level,
        }
    }
}

/// Published once a stop has been processed, before the doors close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalEvent {
    pub unit_id: u32,
    pub level: Level,
    /// The call direction picked up at this stop, if any.
    pub served: Option<CallDirection>,
    /// The call direction left pending because the unit was full, if any.
    pub deferred: Option<CallDirection>,
    /// The unit's state after drop-off and pickup.
    pub snapshot: UnitSnapshot,
    pub timestamp: NaiveDateTime,
}

/// Published when doors open or close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorsEvent {
    pub unit_id: u32,
    pub level: Level,
    /// The call direction the unit is picking up for at this stop. `None` for a pure drop-off
    /// or when the unit is full.
    pub serving: Option<CallDirection>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionChangedEvent {
    pub unit_id: u32,
    pub level: Level,
    pub old_direction: Direction,
    pub new_direction: Direction,
    pub timestamp: NaiveDateTime,
}

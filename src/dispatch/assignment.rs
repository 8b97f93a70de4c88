//! # Call Assignment
//!
//! Chooses the unit for a floor call. Units are grouped into eligibility tiers evaluated in
//! priority order; the first tier with a candidate wins, and within it the nearest unit wins.
//! Ties go to the unit registered first.
//!
//! The opposite-direction tier is listed for completeness but never selected: a call that only such
//! a unit could take stays pending until a later pass finds an en-route or idle unit.

use crate::errors::{ElevatorError, ElevatorResult};
use crate::models::{CallDirection, Direction, Level, UnitSnapshot};

/// One priority class of units for a call.
pub struct EligibilityTier {
    pub name: &'static str,
    /// Whether units in this tier may be given the call
    pub selectable: bool,
    admits: fn(&UnitSnapshot, Level, CallDirection) -> bool,
}

impl EligibilityTier {
    pub fn admits(&self, unit: &UnitSnapshot, level: Level, direction: CallDirection) -> bool {
        (self.admits)(unit, level, direction)
    }
}

/// The tiers in priority order.
pub const ELIGIBILITY_TIERS: [EligibilityTier; 3] = [
    EligibilityTier { name: "en-route", selectable: true, admits: en_route },
    EligibilityTier { name: "idle", selectable: true, admits: idle },
    EligibilityTier { name: "opposite", selectable: false, admits: opposite },
];

/// Travelling in the call's direction and not yet past the call's level.
fn en_route(unit: &UnitSnapshot, level: Level, direction: CallDirection) -> bool {
    unit.direction == Direction::from(direction)
        && match direction {
            CallDirection::Up => unit.level <= level,
            CallDirection::Down => unit.level >= level,
        }
}

fn idle(unit: &UnitSnapshot, _level: Level, _direction: CallDirection) -> bool {
    unit.direction == Direction::Idle
}

fn opposite(unit: &UnitSnapshot, _level: Level, direction: CallDirection) -> bool {
    unit.direction == Direction::from(direction).opposite()
}

/// Distance in levels between a unit and a call.
pub fn cost(unit: &UnitSnapshot, level: Level) -> u32 {
    unit.level.abs_diff(level)
}

/// The outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub unit_id: u32,
    pub tier: &'static str,
    pub cost: u32,
}

/// Picks the unit for a call from `units`, given in registration order.
///
/// Full units are never chosen.
///
/// # Returns
///
/// * `Ok(Selection)` naming the chosen unit
/// * `Err(ElevatorError::NoEligibleUnit)` if no selectable tier has a candidate
pub fn select_unit(units: &[UnitSnapshot], level: Level, direction: CallDirection) -> ElevatorResult<Selection> {
    for tier in ELIGIBILITY_TIERS.iter().filter(|tier| tier.selectable) {
        let best = units.iter()
            .filter(|unit| !unit.is_full() && tier.admits(unit, level, direction))
            .min_by_key(|unit| cost(unit, level));

        if let Some(unit) = best {
            return Ok(Selection {
                unit_id: unit.unit_id,
                tier: tier.name,
                cost: cost(unit, level),
            });
        }
    }
    Err(ElevatorError::NoEligibleUnit { level, direction })
}

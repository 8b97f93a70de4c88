//! # Floors
//!
//! Per-floor call buttons. Pressing sets a flag, door-open and arrival propagation clear it; both are
//! idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::errors::ElevatorResult;
use crate::event_handling::observer::UnitObserver;
use crate::models::{ArrivalEvent, CallDirection, DoorsEvent, Level, LevelBounds};

#[derive(Debug)]
pub struct Floor {
    level: Level,
    up: AtomicBool,
    down: AtomicBool,
}

/// A copy of a floor's button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorStatus {
    pub level: Level,
    pub up: bool,
    pub down: bool,
}

impl Floor {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            up: AtomicBool::new(false),
            down: AtomicBool::new(false),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    fn button(&self, direction: CallDirection) -> &AtomicBool {
        match direction {
            CallDirection::Up => &self.up,
            CallDirection::Down => &self.down,
        }
    }

    /// Lights the button. Returns `false` if it was already lit.
    pub fn press(&self, direction: CallDirection) -> bool {
        !self.button(direction).swap(true, Ordering::SeqCst)
    }

    /// Turns the button off. Returns `false` if it was not lit.
    pub fn clear(&self, direction: CallDirection) -> bool {
        self.button(direction).swap(false, Ordering::SeqCst)
    }

    pub fn is_pressed(&self, direction: CallDirection) -> bool {
        self.button(direction).load(Ordering::SeqCst)
    }

    pub fn press_up(&self) -> bool {
        self.press(CallDirection::Up)
    }

    pub fn press_down(&self) -> bool {
        self.press(CallDirection::Down)
    }

    pub fn clear_up(&self) -> bool {
        self.clear(CallDirection::Up)
    }

    pub fn clear_down(&self) -> bool {
        self.clear(CallDirection::Down)
    }

    pub fn has_up_request(&self) -> bool {
        self.is_pressed(CallDirection::Up)
    }

    pub fn has_down_request(&self) -> bool {
        self.is_pressed(CallDirection::Down)
    }

    pub fn status(&self) -> FloorStatus {
        FloorStatus {
            level: self.level,
            up: self.has_up_request(),
            down: self.has_down_request(),
        }
    }
}

/// One `Floor` per level of the building.
#[derive(Debug)]
pub struct FloorRegistry {
    bounds: LevelBounds,
    floors: Vec<Arc<Floor>>,
}

impl FloorRegistry {
    pub fn new(bounds: LevelBounds) -> Self {
        Self {
            bounds,
            floors: bounds.levels().map(|level| Arc::new(Floor::new(level))).collect(),
        }
    }

    /// The floor at `level`, or `ElevatorError::InvalidLevel`.
    pub fn get(&self, level: Level) -> ElevatorResult<Arc<Floor>> {
        self.bounds.check(level)?;
        let index = (level - self.bounds.min()) as usize;
        Ok(Arc::clone(&self.floors[index]))
    }

    /// Floors with at least one lit button.
    pub fn lit(&self) -> Vec<FloorStatus> {
        self.floors.iter()
            .map(|floor| floor.status())
            .filter(|status| status.up || status.down)
            .collect()
    }
}

/// Turns off the button a unit is about to serve when its doors open, and again once the pickup
/// is done.
///
/// The second clear catches a press made while the doors were open: the dispatcher absorbs it into
/// the call being served, so the button must not stay lit after that call leaves the table.
pub struct FloorButtonObserver {
    floors: Arc<FloorRegistry>,
}

impl FloorButtonObserver {
    pub fn new(floors: Arc<FloorRegistry>) -> Self {
        Self { floors }
    }

    fn clear(&self, level: Level, direction: CallDirection, unit_id: u32) -> ElevatorResult<()> {
        if self.floors.get(level)?.clear(direction) {
            debug!("Cleared {} button at level {} for unit {}", direction, level, unit_id);
        }
        Ok(())
    }
}

impl UnitObserver for FloorButtonObserver {
    fn name(&self) -> &str {
        "floor-buttons"
    }

    fn on_doors_open(&self, event: &DoorsEvent) -> ElevatorResult<()> {
        match event.serving {
            Some(direction) => self.clear(event.level, direction, event.unit_id),
            None => Ok(()),
        }
    }

    fn on_arrival(&self, event: &ArrivalEvent) -> ElevatorResult<()> {
        match event.served {
            Some(direction) => self.clear(event.level, direction, event.unit_id),
            None => Ok(()),
        }
    }
}

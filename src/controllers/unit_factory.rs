use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::info;
use crate::controllers::transport_unit::{TransportUnit, UnitTiming};
use crate::errors::ElevatorResult;
use crate::models::{Level, LevelBounds};

/// Creates transport units with sequential ids, starting at 1.
///
/// Every unit starts at level 0, or at the lowest level when 0 is outside the building.
#[derive(Debug)]
pub struct UnitFactory {
    next_id: AtomicU32,
    bounds: LevelBounds,
    timing: UnitTiming,
}

impl UnitFactory {
    pub fn new(bounds: LevelBounds, timing: UnitTiming) -> Self {
        Self {
            next_id: AtomicU32::new(1),
            bounds,
            timing,
        }
    }

    pub fn start_level(&self) -> Level {
        if self.bounds.contains(0) { 0 } else { self.bounds.min() }
    }

    pub fn create(&self, capacity: u32) -> ElevatorResult<Arc<TransportUnit>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let unit = TransportUnit::new(id, capacity, self.start_level(), self.bounds, self.timing)?;
        info!("Created unit {} with capacity {} at level {}", id, capacity, self.start_level());
        Ok(Arc::new(unit))
    }
}

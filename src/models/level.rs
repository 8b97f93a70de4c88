//! # Levels
//!
//! A level is a plain integer floor identifier. Every level entering the system is checked
//! against the configured `LevelBounds` at the boundary; values outside are rejected, never clamped.

use std::ops::RangeInclusive;
use serde::{Deserialize, Serialize};
use crate::errors::{ElevatorError, ElevatorResult};

/// An integer floor identifier. Negative values are basement levels.
pub type Level = i32;

/// The inclusive range of levels served by a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBounds {
    min: Level,
    max: Level,
}

impl LevelBounds {
    /// Creates a new range, failing if `min > max`.
    pub fn new(min: Level, max: Level) -> ElevatorResult<Self> {
        if min > max {
            return Err(ElevatorError::ConfigError(format!(
                "min_level {} is greater than max_level {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Level {
        self.min
    }

    pub fn max(&self) -> Level {
        self.max
    }

    pub fn contains(&self, level: Level) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Returns the level unchanged when it is in range, or `ElevatorError::InvalidLevel`.
    pub fn check(&self, level: Level) -> ElevatorResult<Level> {
        if self.contains(level) {
            Ok(level)
        } else {
            Err(ElevatorError::InvalidLevel { level, min: self.min, max: self.max })
        }
    }

    pub fn levels(&self) -> RangeInclusive<Level> {
        self.min..=self.max
    }
}

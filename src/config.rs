//! # Configuration Management

//! This module handles the configuration loading and management for the elevator simulation.
//! It leverages the `config` crate to provide a flexible and structured way to define and access configuration settings from various sources, including:

//! * YAML configuration files (default.yaml, development.yaml, production.yaml)
//! * Environment variables

//! The core of this module is the `Settings` struct. Timing constants and level bounds are always read from here
//! and handed to the components at construction; nothing inside the control loops hard-codes them.

use serde::{Deserialize, Serialize};
use config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use crate::errors::{ElevatorError, ElevatorResult};
use crate::models::{Level, LevelBounds};

/// Represents the complete set of configuration settings for the elevator simulation.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// The range of levels served by the building
    pub building: BuildingSettings,
    /// Door, travel and polling durations
    pub timing: TimingSettings,
    /// The fleet created by `Facility::setup` in the demo driver
    pub fleet: FleetSettings,
    /// Settings for application logging
    pub logging: LoggingSettings,
}

/// Holds the level range of the building
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildingSettings {
    /// The lowest level, inclusive. May be negative for basements
    pub min_level: Level,
    /// The highest level, inclusive
    pub max_level: Level,
}

/// Holds every fixed-duration wait used by the control loops, in milliseconds
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimingSettings {
    /// How long the doors stay open at a stop
    pub door_open_ms: u64,
    /// How long closing the doors takes
    pub door_close_ms: u64,
    /// Travel time between two adjacent levels
    pub travel_ms: u64,
    /// The interval at which the dispatcher re-evaluates pending calls
    pub redispatch_interval_ms: u64,
    /// How long a loop is given to stop on shutdown before it is aborted
    pub shutdown_grace_ms: u64,
}

impl TimingSettings {
    pub fn door_open(&self) -> Duration {
        Duration::from_millis(self.door_open_ms)
    }

    pub fn door_close(&self) -> Duration {
        Duration::from_millis(self.door_close_ms)
    }

    pub fn travel(&self) -> Duration {
        Duration::from_millis(self.travel_ms)
    }

    pub fn redispatch_interval(&self) -> Duration {
        Duration::from_millis(self.redispatch_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Holds the size of the fleet
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FleetSettings {
    /// The number of transport units to create
    pub unit_count: usize,
    /// The maximum occupancy of each unit
    pub capacity: u32,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingSettings {
    /// The logging level (e.g., "info", "debug", "error")
    pub level: String,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
    /// Per-target filter directives applied on top of `level` (e.g., "elevator_sim::monitoring=warn")
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for Settings {
    /// The constants of the reference simulation: levels -2..=10, one second per door movement,
    /// two seconds per level, a half-second re-dispatch interval.
    fn default() -> Self {
        Settings {
            building: BuildingSettings { min_level: -2, max_level: 10 },
            timing: TimingSettings {
                door_open_ms: 1000,
                door_close_ms: 1000,
                travel_ms: 2000,
                redispatch_interval_ms: 500,
                shutdown_grace_ms: 2000,
            },
            fleet: FleetSettings { unit_count: 2, capacity: 5 },
            logging: LoggingSettings { level: "info".to_string(), path: None, directives: Vec::new() },
        }
    }
}

/// # Settings Initialization
///
/// The `Settings` implementation provides a `new` function to load and construct the configuration settings.
impl Settings {
    /// Loads and constructs the application settings from various configuration sources.
    ///
    /// This function reads configuration settings from the following sources, in order of precedence:
    ///
    /// 1. `default.yaml`: Contains default settings for the application
    /// 2. Environment-specific YAML file (e.g., `development.yaml` or `production.yaml`) based on the `RUN_MODE` environment variable
    /// 3. Environment variables prefixed with `APP` (e.g., `APP__TIMING__TRAVEL_MS`)
    ///
    /// The `CONFIG_DIR` environment variable can be used to specify the directory where the YAML configuration files are located (defaults to "src/config").
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the settings were loaded and validated successfully
    /// * `Err(ElevatorError)`: If there was an error during loading, deserialization or validation
    pub fn new() -> ElevatorResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "src/config".into());
        debug!("Run Mode: {:?}, Config Dir: {:?}", run_mode, config_dir);

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        debug!("{:#?}", s);
        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(ElevatorError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        s.validate()?;
        Ok(s)
    }

    /// Rejects settings the control loops cannot run with.
    pub fn validate(&self) -> ElevatorResult<()> {
        self.level_bounds()?;
        if self.fleet.capacity == 0 {
            return Err(ElevatorError::ConfigError("fleet.capacity must be at least 1".to_string()));
        }
        if self.timing.redispatch_interval_ms == 0 {
            return Err(ElevatorError::ConfigError("timing.redispatch_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn level_bounds(&self) -> ElevatorResult<LevelBounds> {
        LevelBounds::new(self.building.min_level, self.building.max_level)
    }
}

/// # Elevator Errors
/// This module defines the `ElevatorError` enum, which encapsulates all potential errors that can occur within the elevator simulation.
/// None of these are fatal to a control loop: the component that detects an error logs it and carries on.


use thiserror::Error;
use std::io;
use tokio::task::JoinError;
use crate::models::{CallDirection, Level};

#[derive(Error, Debug)]
pub enum ElevatorError {
    /// A requested level lies outside the configured `[min_level, max_level]` range.
    #[error("Invalid level {level}: expected a value in [{min}, {max}]")]
    InvalidLevel { level: Level, min: Level, max: Level },

    /// A pickup could not be completed because the unit is full. The pickup stays pending.
    #[error("Unit {unit_id} is at capacity, pickup at level {level} deferred")]
    CapacityExceeded { unit_id: u32, level: Level },

    /// No unit is currently eligible for a call. The call stays pending for re-dispatch.
    #[error("No eligible unit for {direction} call at level {level}")]
    NoEligibleUnit { level: Level, direction: CallDirection },

    /// The unit has been shut down and no longer accepts requests.
    #[error("Unit {0} has been shut down")]
    UnitShutDown(u32),

    /// The dispatcher has been shut down and no longer accepts calls.
    #[error("Dispatcher has been shut down")]
    DispatcherShutDown,

    /// Represents an error when a requested unit is not registered with the dispatcher.
    #[error("Unit not found: {0}")]
    UnitNotFound(u32),

    /// An observer failed while handling a notification.
    #[error("Observer error: {0}")]
    ObserverError(String),

    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Represents errors when waiting for tasks to complete.
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

impl From<config::ConfigError> for ElevatorError {
    fn from(err: config::ConfigError) -> Self {
        ElevatorError::ConfigError(err.to_string())
    }
}

impl From<JoinError> for ElevatorError {
    fn from(err: JoinError) -> Self {
        ElevatorError::TaskJoinError(err.to_string())
    }
}

pub type ElevatorResult<T> = Result<T, ElevatorError>;

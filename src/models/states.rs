//! # Unit Run States

use serde::{Deserialize, Serialize};
use derive_more::Display;

/// Represents what a transport unit is physically doing. Exactly one value holds at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display)]
pub enum RunState {
    /// The unit is standing at a level with its doors closed.
    #[display("STOPPED")]
    Stopped,
    /// The unit is travelling between levels.
    #[display("MOVING")]
    Moving,
    /// The unit is standing at a level with its doors open.
    #[display("DOORS_OPEN")]
    DoorsOpen,
}

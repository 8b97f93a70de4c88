//! # Request Sets and Direction Policy
//!
//! `RequestSets` holds the three request sets of one transport unit and answers every question the
//! control loop asks about them: where to go next, whether to stop here, and which call to pick up.
//! It has no locking and no timing, so the scheduling policy can be exercised on its own.

use std::collections::BTreeSet;
use crate::models::{CallDirection, Direction, Level};

/// The internal destinations and assigned external pickups of a single unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSets {
    internal: BTreeSet<Level>,
    external_up: BTreeSet<Level>,
    external_down: BTreeSet<Level>,
}

impl RequestSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an internal destination. Returns `false` if it was already pending.
    pub fn add_internal(&mut self, level: Level) -> bool {
        self.internal.insert(level)
    }

    /// Removes an internal destination. Returns `false` if it was not pending.
    pub fn remove_internal(&mut self, level: Level) -> bool {
        self.internal.remove(&level)
    }

    /// Adds an external pickup. Returns `false` if it was already assigned.
    pub fn add_pickup(&mut self, level: Level, direction: CallDirection) -> bool {
        self.pickups_mut(direction).insert(level)
    }

    /// Removes an external pickup. Returns `false` if it was not assigned.
    pub fn remove_pickup(&mut self, level: Level, direction: CallDirection) -> bool {
        self.pickups_mut(direction).remove(&level)
    }

    pub fn has_pickup(&self, level: Level, direction: CallDirection) -> bool {
        self.pickups(direction).contains(&level)
    }

    pub fn internal(&self) -> &BTreeSet<Level> {
        &self.internal
    }

    pub fn pickups(&self, direction: CallDirection) -> &BTreeSet<Level> {
        match direction {
            CallDirection::Up => &self.external_up,
            CallDirection::Down => &self.external_down,
        }
    }

    fn pickups_mut(&mut self, direction: CallDirection) -> &mut BTreeSet<Level> {
        match direction {
            CallDirection::Up => &mut self.external_up,
            CallDirection::Down => &mut self.external_down,
        }
    }

    pub fn has_pickups(&self) -> bool {
        !self.external_up.is_empty() || !self.external_down.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && !self.has_pickups()
    }

    /// Whether any request of any kind lies strictly beyond `level` in `direction`.
    ///
    /// Pickups for the opposite call direction count too: a down-call above a unit moving up
    /// can only be reached by continuing up.
    pub fn ahead(&self, level: Level, direction: Direction) -> bool {
        match direction {
            Direction::Up => [&self.internal, &self.external_up, &self.external_down]
                .iter()
                .any(|set| set.range(level + 1..).next().is_some()),
            Direction::Down => [&self.internal, &self.external_up, &self.external_down]
                .iter()
                .any(|set| set.range(..level).next().is_some()),
            Direction::Idle => false,
        }
    }

    /// Whether a unit travelling in `direction` should stop at `level`.
    ///
    /// An idle unit stops for any request at its level. `pickups_blocked` hides the pickups at
    /// `level`; it is set after a pickup there was deferred because the unit was full.
    pub fn should_stop(&self, level: Level, direction: Direction, pickups_blocked: bool) -> bool {
        if self.internal.contains(&level) {
            return true;
        }
        if pickups_blocked {
            return false;
        }
        match direction {
            Direction::Up => self.external_up.contains(&level),
            Direction::Down => self.external_down.contains(&level),
            Direction::Idle => self.external_up.contains(&level) || self.external_down.contains(&level),
        }
    }

    /// The call direction a unit travelling in `direction` picks up for at `level`.
    ///
    /// An idle unit serves an up-call before a down-call at the same level.
    pub fn pickup_direction(&self, level: Level, direction: Direction) -> Option<CallDirection> {
        let candidates: &[CallDirection] = match direction {
            Direction::Up => &[CallDirection::Up],
            Direction::Down => &[CallDirection::Down],
            Direction::Idle => &CallDirection::ALL,
        };
        candidates.iter().copied().find(|dir| self.has_pickup(level, *dir))
    }

    /// Computes the direction a unit at `level` should travel in next.
    ///
    /// While moving, the unit keeps its direction as long as an internal request or a
    /// same-direction pickup remains at its level, or any request remains beyond it. It reverses
    /// only when nothing remains ahead, and goes idle only when nothing remains at all.
    ///
    /// While idle, internal requests win: head for the highest one if below it, otherwise the
    /// lowest one if above it. Without internal requests, head for up-calls above, then down-calls
    /// below, then any remaining call, `Up` first. A request at the current level keeps the unit idle
    /// so that it stops where it is.
    pub fn next_direction(&self, level: Level, current: Direction, pickups_blocked: bool) -> Direction {
        let here_internal = self.internal.contains(&level);
        let here_up = !pickups_blocked && self.external_up.contains(&level);
        let here_down = !pickups_blocked && self.external_down.contains(&level);

        match current {
            Direction::Up => {
                if here_internal || here_up || self.ahead(level, Direction::Up) {
                    Direction::Up
                } else if here_down || self.ahead(level, Direction::Down) {
                    Direction::Down
                } else {
                    Direction::Idle
                }
            }
            Direction::Down => {
                if here_internal || here_down || self.ahead(level, Direction::Down) {
                    Direction::Down
                } else if here_up || self.ahead(level, Direction::Up) {
                    Direction::Up
                } else {
                    Direction::Idle
                }
            }
            Direction::Idle => {
                if let (Some(&lowest), Some(&highest)) = (self.internal.first(), self.internal.last()) {
                    if level < highest {
                        Direction::Up
                    } else if level > lowest {
                        Direction::Down
                    } else {
                        Direction::Idle
                    }
                } else if here_up || here_down {
                    Direction::Idle
                } else if self.external_up.last().is_some_and(|&highest| level < highest) {
                    Direction::Up
                } else if self.external_down.first().is_some_and(|&lowest| level > lowest) {
                    Direction::Down
                } else if self.ahead(level, Direction::Up) {
                    Direction::Up
                } else if self.ahead(level, Direction::Down) {
                    Direction::Down
                } else {
                    Direction::Idle
                }
            }
        }
    }
}

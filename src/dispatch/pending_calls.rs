//! # Pending Call Table
//!
//! The dispatcher's record of floor calls that have not been served yet. A call is either waiting
//! for a unit or assigned to one; it leaves the table once the assigned unit reports the pickup.
//! A level is present only while at least one of its two directions holds a call.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use crate::models::{CallDirection, Level};

/// The state of one (level, direction) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    /// No unit has taken the call yet. Every dispatch pass retries it.
    Waiting,
    /// A unit holds the call in its pickup set but has not served it yet.
    Assigned { unit_id: u32 },
}

/// The up and down calls at one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    pub up: Option<CallStatus>,
    pub down: Option<CallStatus>,
}

impl PendingCall {
    pub fn get(&self, direction: CallDirection) -> Option<CallStatus> {
        match direction {
            CallDirection::Up => self.up,
            CallDirection::Down => self.down,
        }
    }

    fn slot_mut(&mut self, direction: CallDirection) -> &mut Option<CallStatus> {
        match direction {
            CallDirection::Up => &mut self.up,
            CallDirection::Down => &mut self.down,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.up.is_none() && self.down.is_none()
    }
}

#[derive(Debug, Default)]
pub struct PendingCallTable {
    calls: DashMap<Level, PendingCall>,
}

impl PendingCallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new call as waiting.
    ///
    /// Returns `false` if a call for this level and direction is already pending, waiting or assigned.
    pub fn mark_waiting(&self, level: Level, direction: CallDirection) -> bool {
        let mut call = self.calls.entry(level).or_default();
        let slot = call.slot_mut(direction);
        if slot.is_some() {
            return false;
        }
        *slot = Some(CallStatus::Waiting);
        true
    }

    /// Marks a waiting call as taken by `unit_id`. Returns `false` if the call was not waiting.
    pub fn mark_assigned(&self, level: Level, direction: CallDirection, unit_id: u32) -> bool {
        match self.calls.get_mut(&level) {
            Some(mut call) => {
                let slot = call.slot_mut(direction);
                if *slot == Some(CallStatus::Waiting) {
                    *slot = Some(CallStatus::Assigned { unit_id });
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Returns an assigned call to the waiting state. Returns `false` if it was not assigned.
    pub fn revert_to_waiting(&self, level: Level, direction: CallDirection) -> bool {
        match self.calls.get_mut(&level) {
            Some(mut call) => {
                let slot = call.slot_mut(direction);
                if matches!(slot, Some(CallStatus::Assigned { .. })) {
                    *slot = Some(CallStatus::Waiting);
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Removes a call, and the level's entry once both directions are clear.
    ///
    /// Returns `false` if there was no such call.
    pub fn clear(&self, level: Level, direction: CallDirection) -> bool {
        let cleared = match self.calls.get_mut(&level) {
            Some(mut call) => call.slot_mut(direction).take().is_some(),
            None => false,
        };
        self.calls.remove_if(&level, |_, call| call.is_clear());
        cleared
    }

    pub fn status(&self, level: Level, direction: CallDirection) -> Option<CallStatus> {
        self.calls.get(&level).and_then(|call| call.get(direction))
    }

    pub fn get(&self, level: Level) -> Option<PendingCall> {
        self.calls.get(&level).map(|call| *call)
    }

    /// Waiting calls ordered by level, up before down.
    pub fn waiting(&self) -> Vec<(Level, CallDirection)> {
        let mut waiting: Vec<_> = self.calls.iter()
            .flat_map(|entry| {
                let level = *entry.key();
                let call = *entry.value();
                CallDirection::ALL.into_iter()
                    .filter(move |dir| call.get(*dir) == Some(CallStatus::Waiting))
                    .map(move |dir| (level, dir))
            })
            .collect();
        waiting.sort();
        waiting
    }

    /// Assigned calls with the unit holding each, ordered by level, up before down.
    pub fn assigned(&self) -> Vec<(Level, CallDirection, u32)> {
        let mut assigned: Vec<_> = self.calls.iter()
            .flat_map(|entry| {
                let level = *entry.key();
                let call = *entry.value();
                CallDirection::ALL.into_iter().filter_map(move |dir| match call.get(dir) {
                    Some(CallStatus::Assigned { unit_id }) => Some((level, dir, unit_id)),
                    _ => None,
                })
            })
            .collect();
        assigned.sort();
        assigned
    }

    /// A copy of the whole table ordered by level.
    pub fn snapshot(&self) -> Vec<(Level, PendingCall)> {
        let mut calls: Vec<_> = self.calls.iter().map(|entry| (*entry.key(), *entry.value())).collect();
        calls.sort_by_key(|(level, _)| *level);
        calls
    }

    /// The number of levels with at least one pending call.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/*!
 * Scheduler State Machine
 * States of the scheduler process and their legal transitions
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SchedulerState {
    /// The scheduler process itself is stopped
    Suspended = 0,
    /// Running, nothing dispatched
    Idle = 1,
    /// At least one job continued and present in the running set
    Dispatching = 2,
    /// A quantum expired; the job is being stopped and requeued
    Preempting = 3,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Suspended => "suspended",
            SchedulerState::Idle => "idle",
            SchedulerState::Dispatching => "dispatching",
            SchedulerState::Preempting => "preempting",
        }
    }

    /// Whether `self -> to` is a legal edge
    ///
    /// Staying in a state is always legal. Any state may be suspended by the
    /// shell.
    pub const fn can_transition(self, to: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, to),
            (_, Suspended)
                | (Suspended, Suspended)
                | (Suspended, Idle)
                | (Idle, Idle)
                | (Idle, Dispatching)
                | (Dispatching, Dispatching)
                | (Dispatching, Preempting)
                | (Dispatching, Idle)
                | (Preempting, Preempting)
                | (Preempting, Idle)
                | (Preempting, Dispatching)
        )
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SchedulerState::Idle,
            2 => SchedulerState::Dispatching,
            3 => SchedulerState::Preempting,
            _ => SchedulerState::Suspended,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, atomically updated scheduler state
#[repr(transparent)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub const fn new(state: SchedulerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn get(&self) -> SchedulerState {
        SchedulerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` if the edge is legal; returns whether it moved
    pub fn transition(&self, to: SchedulerState) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let from = SchedulerState::from_u8(current);
            if !from.can_transition(to) {
                trace!(from = %from, to = %to, "Rejected scheduler transition");
                return false;
            }
            match self
                .0
                .compare_exchange_weak(current, to as u8, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(SchedulerState::Suspended)
    }
}

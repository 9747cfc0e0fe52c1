/*!
 * Process Types
 * Process-control records shared between the shell and the scheduler
 */

use crate::core::clock::elapsed;
use crate::core::limits::NAME_CAPACITY;
use crate::core::types::{Nanos, Pid, Tier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifecycle of a registered job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RecordState {
    /// Unused registry slot
    Vacant = 0,
    /// Parked, waiting in a ready queue
    Queued = 1,
    /// Continued by the scheduler, present in the running set
    Running = 2,
    /// Terminated and reconciled; retired in place
    Finished = 3,
}

impl RecordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Vacant => "vacant",
            RecordState::Queued => "queued",
            RecordState::Running => "running",
            RecordState::Finished => "finished",
        }
    }
}

/// Fixed-capacity UTF-8 name stored inline (no heap pointer may cross processes)
#[derive(Clone, Copy)]
#[repr(C)]
pub struct InlineName {
    len: u16,
    bytes: [u8; NAME_CAPACITY],
}

impl InlineName {
    pub const EMPTY: InlineName = InlineName {
        len: 0,
        bytes: [0; NAME_CAPACITY],
    };

    /// Copy `name`, truncating on a character boundary if it does not fit
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(NAME_CAPACITY);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0; NAME_CAPACITY];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            len: end as u16,
            bytes,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for InlineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for InlineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for InlineName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for InlineName {}

/// One record per submitted job
///
/// Plain data so it can live in the shared registry. `execution_ns` only
/// grows: every dispatch interval is folded in exactly once, either when the
/// job is preempted or when its exit is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ProcessControlRecord {
    pub pid: Pid,
    pub name: InlineName,
    pub tier: Tier,
    pub state: RecordState,
    /// Cumulative execution time
    pub execution_ns: Nanos,
    /// Start of the current (or last) dispatch interval
    pub dispatch_start_ns: Nanos,
    /// End of the last finished dispatch interval
    pub dispatch_end_ns: Nanos,
    pub submitted_ns: Nanos,
    pub finished_ns: Nanos,
    pub dispatches: u32,
    pub preemptions: u32,
    /// Exit code, or the negated signal number when killed
    pub exit_status: i32,
}

impl ProcessControlRecord {
    pub const VACANT: ProcessControlRecord = ProcessControlRecord {
        pid: 0,
        name: InlineName::EMPTY,
        tier: Tier::HIGHEST,
        state: RecordState::Vacant,
        execution_ns: 0,
        dispatch_start_ns: 0,
        dispatch_end_ns: 0,
        submitted_ns: 0,
        finished_ns: 0,
        dispatches: 0,
        preemptions: 0,
        exit_status: 0,
    };

    #[must_use]
    pub fn new(pid: Pid, name: &str, tier: Tier, submitted_ns: Nanos) -> Self {
        Self {
            pid,
            name: InlineName::new(name),
            tier,
            state: RecordState::Queued,
            submitted_ns,
            ..Self::VACANT
        }
    }

    /// Close the current dispatch interval at `now`, returning its length
    pub fn close_interval(&mut self, now: Nanos) -> Duration {
        let interval = elapsed(self.dispatch_start_ns, now);
        self.execution_ns = self.execution_ns.saturating_add(interval.as_nanos() as Nanos);
        self.dispatch_end_ns = now;
        interval
    }

    /// Retire the record in place
    pub fn retire(&mut self, now: Nanos, exit_status: i32) {
        self.state = RecordState::Finished;
        self.finished_ns = now;
        self.exit_status = exit_status;
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, RecordState::Finished)
    }

    #[inline]
    #[must_use]
    pub fn execution_time(&self) -> Duration {
        Duration::from_nanos(self.execution_ns)
    }

    /// Submission to completion, once finished
    #[must_use]
    pub fn turnaround(&self) -> Option<Duration> {
        self.is_finished()
            .then(|| elapsed(self.submitted_ns, self.finished_ns))
    }

    /// Time spent parked: turnaround minus execution, floored at zero
    #[must_use]
    pub fn wait_time(&self) -> Option<Duration> {
        self.turnaround()
            .map(|turnaround| turnaround.saturating_sub(self.execution_time()))
    }
}

impl Default for ProcessControlRecord {
    fn default() -> Self {
        Self::VACANT
    }
}

/// Serializable view of a record for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub pid: Pid,
    pub name: String,
    pub tier: Tier,
    pub state: RecordState,
    pub execution_ms: u64,
    pub wait_ms: Option<u64>,
    pub dispatches: u32,
    pub preemptions: u32,
    pub exit_status: Option<i32>,
}

impl From<&ProcessControlRecord> for JobReport {
    fn from(record: &ProcessControlRecord) -> Self {
        Self {
            pid: record.pid,
            name: record.name.as_str().to_string(),
            tier: record.tier,
            state: record.state,
            execution_ms: record.execution_time().as_millis() as u64,
            wait_ms: record.wait_time().map(|d| d.as_millis() as u64),
            dispatches: record.dispatches,
            preemptions: record.preemptions,
            exit_status: record.is_finished().then_some(record.exit_status),
        }
    }
}

/*!
 * Running Set
 * Jobs currently continued by the scheduler, with their dispatch start
 */

use crate::core::errors::SchedulerError;
use crate::core::limits::MAX_JOBS;
use crate::core::types::{Nanos, Pid, Slot};
use tracing::warn;

/// A dispatched job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RunningEntry {
    pub slot: Slot,
    pub pid: Pid,
    pub started_ns: Nanos,
    /// Timer ticks observed since this dispatch
    pub ticks: u32,
}

impl RunningEntry {
    const EMPTY: RunningEntry = RunningEntry::new(0, 0, 0);

    pub const fn new(slot: Slot, pid: Pid, started_ns: Nanos) -> Self {
        Self {
            slot,
            pid,
            started_ns,
            ticks: 0,
        }
    }
}

/// Compact array of dispatched jobs; removal shifts later entries left
#[repr(C)]
pub struct RunningSet {
    entries: [RunningEntry; MAX_JOBS],
    len: u32,
}

impl RunningSet {
    pub const fn new() -> Self {
        Self {
            entries: [RunningEntry::EMPTY; MAX_JOBS],
            len: 0,
        }
    }

    pub fn mark_running(&mut self, entry: RunningEntry) -> Result<(), SchedulerError> {
        let len = self.len as usize;
        if len >= MAX_JOBS {
            return Err(SchedulerError::RunningSetFull { capacity: MAX_JOBS });
        }
        self.entries[len] = entry;
        self.len += 1;
        Ok(())
    }

    /// Remove and return the entry for `pid`
    ///
    /// An unknown pid is logged and tolerated: a termination can race a
    /// preemption that already took the job out.
    pub fn mark_done(&mut self, pid: Pid) -> Option<RunningEntry> {
        let Some(index) = self.index_of(pid) else {
            warn!(pid, "Process not found in running set");
            return None;
        };

        let entry = self.entries[index];
        let len = self.len as usize;
        self.entries.copy_within(index + 1..len, index);
        self.len -= 1;
        Some(entry)
    }

    pub fn find(&self, pid: Pid) -> Option<&RunningEntry> {
        self.index_of(pid).map(|index| &self.entries[index])
    }

    /// Count one timer tick against every dispatched job
    pub fn count_tick(&mut self) {
        let len = self.len as usize;
        for entry in &mut self.entries[..len] {
            entry.ticks = entry.ticks.saturating_add(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunningEntry> {
        self.entries[..self.len as usize].iter()
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn index_of(&self, pid: Pid) -> Option<usize> {
        self.iter().position(|entry| entry.pid == pid)
    }
}

impl Default for RunningSet {
    fn default() -> Self {
        Self::new()
    }
}

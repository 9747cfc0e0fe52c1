/*!
 * Shared Process Registry
 * Fixed-capacity table of process-control records, one per submitted job
 */

use super::core::types::{ProcessControlRecord, RecordState};
use crate::core::errors::SchedulerError;
use crate::core::limits::MAX_JOBS;
use crate::core::types::{Pid, Slot};

/// Append-only record table
///
/// Slots are handed out in submission order and never reused. Records are
/// retired in place when their job finishes.
#[repr(C)]
pub struct Registry {
    records: [ProcessControlRecord; MAX_JOBS],
    len: u32,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            records: [ProcessControlRecord::VACANT; MAX_JOBS],
            len: 0,
        }
    }

    /// Append a record, returning its slot
    pub fn register(&mut self, record: ProcessControlRecord) -> Result<Slot, SchedulerError> {
        let slot = self.len as usize;
        if slot >= MAX_JOBS {
            return Err(SchedulerError::RegistryFull { capacity: MAX_JOBS });
        }

        self.records[slot] = record;
        self.len += 1;
        Ok(slot as Slot)
    }

    /// Apply `mutator` to the live record of `pid`; false when absent
    pub fn update<F>(&mut self, pid: Pid, mutator: F) -> bool
    where
        F: FnOnce(&mut ProcessControlRecord),
    {
        match self.slot_of(pid) {
            Some(slot) => {
                mutator(&mut self.records[slot as usize]);
                true
            }
            None => false,
        }
    }

    /// Slot of the most recent record for `pid`
    ///
    /// Searched newest first so a recycled OS pid resolves to the latest job.
    pub fn slot_of(&self, pid: Pid) -> Option<Slot> {
        self.populated()
            .iter()
            .rposition(|record| record.pid == pid)
            .map(|index| index as Slot)
    }

    /// Slot of the unfinished record for `pid`
    pub fn live_slot_of(&self, pid: Pid) -> Option<Slot> {
        self.populated()
            .iter()
            .rposition(|record| record.pid == pid && !record.is_finished())
            .map(|index| index as Slot)
    }

    pub fn get(&self, slot: Slot) -> Option<&ProcessControlRecord> {
        self.populated().get(slot as usize)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut ProcessControlRecord> {
        let len = self.len as usize;
        self.records[..len].get_mut(slot as usize)
    }

    pub fn find(&self, pid: Pid) -> Option<&ProcessControlRecord> {
        self.slot_of(pid).and_then(|slot| self.get(slot))
    }

    /// Registered records in submission order
    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlRecord> {
        self.populated().iter()
    }

    /// Records not yet finished
    pub fn unfinished(&self) -> impl Iterator<Item = &ProcessControlRecord> {
        self.iter()
            .filter(|record| record.state != RecordState::Finished)
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len as usize >= MAX_JOBS
    }

    pub const fn capacity(&self) -> usize {
        MAX_JOBS
    }

    fn populated(&self) -> &[ProcessControlRecord] {
        &self.records[..self.len as usize]
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/*!
 * Command History
 * Append-only, bounded record of every command line with its timing
 */

use crate::core::types::Pid;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    /// Job or foreground child pid, 0 when none
    pub pid: Pid,
    pub started_at: OffsetDateTime,
    /// None while a submitted job is still running
    pub finished_at: Option<OffsetDateTime>,
}

impl HistoryEntry {
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at
            .map(|end| (end - self.started_at).unsigned_abs())
    }
}

/// Bounded history; lines past capacity are dropped with a warning
pub struct History {
    entries: Vec<HistoryEntry>,
    capacity: usize,
    dropped: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(64)),
            capacity,
            dropped: 0,
        }
    }

    /// Start an entry; returns its index, or None once full
    pub fn begin(&mut self, command: &str, at: OffsetDateTime) -> Option<usize> {
        if self.entries.len() >= self.capacity {
            if self.dropped == 0 {
                warn!(capacity = self.capacity, "History full, further commands not recorded");
            }
            self.dropped += 1;
            return None;
        }

        self.entries.push(HistoryEntry {
            command: command.to_string(),
            pid: 0,
            started_at: at,
            finished_at: None,
        });
        Some(self.entries.len() - 1)
    }

    /// Attach the pid of the process the command started
    pub fn set_pid(&mut self, index: Option<usize>, pid: Pid) {
        if let Some(entry) = index.and_then(|i| self.entries.get_mut(i)) {
            entry.pid = pid;
        }
    }

    /// Finish an entry that completed synchronously
    pub fn complete(&mut self, index: Option<usize>, at: OffsetDateTime) {
        if let Some(entry) = index.and_then(|i| self.entries.get_mut(i)) {
            entry.finished_at = Some(at);
        }
    }

    /// Stamp completion for the pending entry of a job that exited
    ///
    /// Returns false when no entry is waiting on `pid`.
    pub fn stamp_exit(&mut self, pid: Pid, at: OffsetDateTime) -> bool {
        match self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| entry.pid == pid && entry.finished_at.is_none())
        {
            Some(entry) => {
                entry.finished_at = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters living in the shared coordination block
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub submitted: u64,
    pub dispatched: u64,
    pub preemptions: u64,
    pub completed: u64,
    pub lock_contention: u64,
}

/// Counters updated by both the shell and the scheduler process
///
/// # Performance
/// - Cache-line aligned so the hot counters don't share a line with the lock
/// - Relaxed ordering; a snapshot may be slightly skewed across fields
#[repr(C, align(64))]
pub struct AtomicSchedulerStats {
    submitted: AtomicU64,
    dispatched: AtomicU64,
    preemptions: AtomicU64,
    completed: AtomicU64,
}

impl AtomicSchedulerStats {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            preemptions: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called on every dispatch
    #[inline(always)]
    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn snapshot(&self, lock_contention: u64) -> SchedulerStats {
        SchedulerStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            lock_contention,
        }
    }
}

impl Default for AtomicSchedulerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = AtomicSchedulerStats::new();
        stats.inc_submitted();
        stats.inc_submitted();
        stats.inc_dispatched();
        stats.inc_preemptions();
        stats.inc_completed();

        let snapshot = stats.snapshot(3);
        assert_eq!(
            snapshot,
            SchedulerStats {
                submitted: 2,
                dispatched: 1,
                preemptions: 1,
                completed: 1,
                lock_contention: 3,
            }
        );
    }

    #[test]
    fn test_alignment() {
        assert_eq!(std::mem::align_of::<AtomicSchedulerStats>(), 64);
    }
}

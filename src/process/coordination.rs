/*!
 * Coordination Context
 *
 * Everything the shell and the scheduler process share, in one block mapped
 * before the scheduler is forked. The registry, the ready queues and the
 * running set sit behind a single cross-process lock; counters and the
 * scheduler state are atomics readable without it.
 */

use super::core::types::{ProcessControlRecord, RecordState};
use super::registry::Registry;
use super::scheduler::atomic_stats::{AtomicSchedulerStats, SchedulerStats};
use super::scheduler::machine::{SchedulerState, StateCell};
use super::scheduler::queues::ReadyQueues;
use super::scheduler::running::RunningSet;
use crate::core::errors::SchedulerError;
use crate::core::limits::MAX_JOBS;
use crate::core::types::{KernelResult, Pid, Slot, Tier};
use crate::ipc::{ShmMutex, ShmRegion, ShmSafe};
use std::ops::Deref;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Scheduling tables guarded together
#[repr(C)]
pub struct SchedTables {
    pub registry: Registry,
    pub queues: ReadyQueues,
    pub running: RunningSet,
}

impl SchedTables {
    pub const fn new() -> Self {
        Self {
            registry: Registry::new(),
            queues: ReadyQueues::new(),
            running: RunningSet::new(),
        }
    }

    /// Register `record` and queue it at its tier
    ///
    /// Capacity is checked before anything is written, so a failed admission
    /// leaves both tables untouched.
    pub fn admit(&mut self, record: ProcessControlRecord) -> Result<Slot, SchedulerError> {
        if self.registry.is_full() {
            return Err(SchedulerError::RegistryFull { capacity: MAX_JOBS });
        }
        if self.queues.is_full(record.tier) {
            return Err(SchedulerError::QueueFull {
                tier: record.tier.level(),
                capacity: MAX_JOBS,
            });
        }

        let slot = self.registry.register(record)?;
        self.queues.enqueue(record.tier, slot)?;
        Ok(slot)
    }

    pub fn record(&self, slot: Slot) -> Result<&ProcessControlRecord, SchedulerError> {
        self.registry.get(slot).ok_or(SchedulerError::UnknownSlot(slot))
    }

    pub fn record_mut(&mut self, slot: Slot) -> Result<&mut ProcessControlRecord, SchedulerError> {
        self.registry
            .get_mut(slot)
            .ok_or(SchedulerError::UnknownSlot(slot))
    }

    /// Every unfinished job is in exactly one place, finished jobs in none
    ///
    /// Queued records sit in the queue of their own tier, running records in
    /// the running set under their own pid.
    pub fn is_consistent(&self) -> bool {
        self.registry.iter().enumerate().all(|(index, record)| {
            let slot = index as Slot;
            let queued_at = self.queues.tier_of(slot);
            let queued_once = Tier::all()
                .map(|tier| self.queues.queue(tier).iter().filter(|&s| s == slot).count())
                .sum::<usize>();
            let running = self.running.iter().filter(|entry| entry.slot == slot).count();

            match record.state {
                RecordState::Queued => {
                    queued_once == 1 && queued_at == Some(record.tier) && running == 0
                }
                RecordState::Running => {
                    queued_once == 0
                        && running == 1
                        && self.running.find(record.pid).map(|e| e.slot) == Some(slot)
                }
                RecordState::Finished | RecordState::Vacant => queued_once == 0 && running == 0,
            }
        })
    }
}

impl Default for SchedTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Block placed in the shared mapping
#[repr(C)]
pub struct CoordinationBlock {
    pub tables: ShmMutex<SchedTables>,
    pub stats: AtomicSchedulerStats,
    pub state: StateCell,
    run_generation: AtomicU64,
    scheduler_pid: AtomicI32,
}

// SAFETY: plain data; mutation through ShmMutex and atomics only
unsafe impl ShmSafe for CoordinationBlock {}

impl CoordinationBlock {
    pub const fn new() -> Self {
        Self {
            tables: ShmMutex::new(SchedTables::new()),
            stats: AtomicSchedulerStats::new(),
            state: StateCell::new(SchedulerState::Suspended),
            run_generation: AtomicU64::new(0),
            scheduler_pid: AtomicI32::new(0),
        }
    }

    /// Ask the scheduler to (re)arm its timer; returns the new generation
    pub fn request_run(&self) -> u64 {
        self.run_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of `run` requests so far; zero means preemption is not armed
    #[inline]
    pub fn run_generation(&self) -> u64 {
        self.run_generation.load(Ordering::Acquire)
    }

    pub fn set_scheduler_pid(&self, pid: Pid) {
        self.scheduler_pid.store(pid, Ordering::Release);
    }

    pub fn scheduler_pid(&self) -> Option<Pid> {
        match self.scheduler_pid.load(Ordering::Acquire) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub fn stats_snapshot(&self) -> SchedulerStats {
        self.stats.snapshot(self.tables.contention())
    }
}

impl Default for CoordinationBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the shared coordination block
///
/// Created once in `main` before the scheduler is forked; the shell side and
/// the scheduler loop both receive a clone.
#[derive(Clone)]
pub struct Coordination {
    region: Arc<ShmRegion<CoordinationBlock>>,
}

impl Coordination {
    pub fn create() -> KernelResult<Self> {
        let region = ShmRegion::new(CoordinationBlock::new())?;
        info!(bytes = region.mapped_bytes(), "Coordination block mapped");
        Ok(Self {
            region: Arc::new(region),
        })
    }
}

impl Deref for Coordination {
    type Target = CoordinationBlock;

    fn deref(&self) -> &CoordinationBlock {
        &self.region
    }
}

/*!
 * Child-Exit Reconciliation
 *
 * On SIGCHLD the shell drains every terminated child and reconciles each
 * one against the shared tables: a running job has its final interval
 * folded in, a queued job (killed while parked) is pulled out of its queue,
 * and the record is retired in place. Misses are expected races and are
 * only logged at debug level.
 */

use crate::core::types::{Nanos, Pid, Slot, Tier};
use crate::monitoring::span_operation;
use crate::process::coordination::CoordinationBlock;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid as NixPid;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A terminated child collected by [`drain_exits`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub pid: Pid,
    /// Exit code, or the negated signal number when killed
    pub status: i32,
}

/// Outcome of reconciling one exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The job was dispatched; its last interval was folded in
    Running { slot: Slot, final_interval: Duration },
    /// The job was parked; it was removed from its queue if still there
    Queued { slot: Slot, tier: Option<Tier> },
    /// The pid belongs to a job reconciled earlier
    AlreadyFinished,
    /// Never submitted (a foreground command, or the scheduler itself)
    Untracked,
}

/// Collect every child that has exited, without blocking
pub fn drain_exits() -> Vec<ExitReport> {
    let mut exits = Vec::new();
    loop {
        match waitpid(NixPid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => exits.push(ExitReport {
                pid: pid.as_raw(),
                status: code,
            }),
            Ok(WaitStatus::Signaled(pid, signal, _)) => exits.push(ExitReport {
                pid: pid.as_raw(),
                status: -(signal as i32),
            }),
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!(error = %e, "waitpid failed while draining exits");
                break;
            }
        }
    }
    exits
}

/// Retire the job `pid` after it terminated with `status` at `now`
///
/// Idempotent: a second call for the same pid finds no live record and
/// returns [`Reconciliation::AlreadyFinished`] without touching anything.
pub fn reconcile_exit(block: &CoordinationBlock, pid: Pid, status: i32, now: Nanos) -> Reconciliation {
    let _span = span_operation("reconcile_exit");
    let mut tables = block.tables.lock();

    let Some(slot) = tables.registry.live_slot_of(pid) else {
        let outcome = if tables.registry.slot_of(pid).is_some() {
            Reconciliation::AlreadyFinished
        } else {
            Reconciliation::Untracked
        };
        debug!(pid, ?outcome, "Exit needs no reconciliation");
        return outcome;
    };

    let running = tables.running.find(pid).copied();
    let outcome = match running {
        Some(_) => {
            tables.running.mark_done(pid);
            let final_interval = match tables.record_mut(slot) {
                Ok(record) => record.close_interval(now),
                Err(_) => Duration::ZERO,
            };
            Reconciliation::Running {
                slot,
                final_interval,
            }
        }
        None => Reconciliation::Queued {
            slot,
            tier: tables.queues.remove_anywhere(slot),
        },
    };

    if let Ok(record) = tables.record_mut(slot) {
        record.retire(now, status);
        info!(
            pid,
            name = %record.name,
            status,
            execution_ms = record.execution_time().as_millis() as u64,
            "Job finished"
        );
    }
    block.stats.inc_completed();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::core::types::{ProcessControlRecord, RecordState};
    use crate::process::scheduler::running::RunningEntry;

    const MS: Nanos = 1_000_000;

    fn block_with_job(pid: Pid) -> Box<CoordinationBlock> {
        let block = Box::new(CoordinationBlock::new());
        let record = ProcessControlRecord::new(pid, "job", Tier::HIGHEST, 0);
        block.tables.lock().admit(record).unwrap();
        block
    }

    #[test]
    fn test_running_job_folds_final_interval() {
        let block = block_with_job(40);
        {
            let mut tables = block.tables.lock();
            tables.queues.dequeue_highest_nonempty();
            tables
                .running
                .mark_running(RunningEntry::new(0, 40, 10 * MS))
                .unwrap();
            let record = tables.record_mut(0).unwrap();
            record.state = RecordState::Running;
            record.dispatch_start_ns = 10 * MS;
            record.execution_ns = 5 * MS;
        }

        let outcome = reconcile_exit(&block, 40, 0, 30 * MS);
        assert_eq!(
            outcome,
            Reconciliation::Running {
                slot: 0,
                final_interval: Duration::from_millis(20)
            }
        );

        let tables = block.tables.lock();
        let record = tables.registry.find(40).unwrap();
        assert_eq!(record.state, RecordState::Finished);
        assert_eq!(record.execution_ns, 25 * MS);
        assert_eq!(record.finished_ns, 30 * MS);
        assert!(tables.running.is_empty());
        assert!(tables.is_consistent());
    }

    #[test]
    fn test_killed_while_queued_leaves_queue() {
        let block = block_with_job(41);
        let outcome = reconcile_exit(&block, 41, -9, 5 * MS);
        assert_eq!(
            outcome,
            Reconciliation::Queued {
                slot: 0,
                tier: Some(Tier::HIGHEST)
            }
        );

        let tables = block.tables.lock();
        assert!(tables.queues.is_empty());
        assert_eq!(tables.registry.find(41).unwrap().exit_status, -9);
        assert_eq!(tables.registry.find(41).unwrap().execution_ns, 0);
    }

    #[test]
    fn test_second_notification_is_noop() {
        let block = block_with_job(42);
        reconcile_exit(&block, 42, 0, 5 * MS);
        assert_eq!(
            reconcile_exit(&block, 42, 1, 9 * MS),
            Reconciliation::AlreadyFinished
        );
        let tables = block.tables.lock();
        let record = tables.registry.find(42).unwrap();
        assert_eq!(record.exit_status, 0);
        assert_eq!(record.finished_ns, 5 * MS);
        assert_eq!(block.stats.snapshot(0).completed, 1);
    }

    #[test]
    fn test_unknown_pid_is_untracked() {
        let block = block_with_job(43);
        assert_eq!(reconcile_exit(&block, 999, 0, 0), Reconciliation::Untracked);
    }
}

/*!
 * Dispatcher
 *
 * Scheduling decisions over the shared tables: fill the running set from the
 * highest non-empty tier, and stop, demote and requeue jobs whose quantum
 * expired. Stop/continue goes through [`ProcessControl`] and the clock is a
 * parameter, so every decision can be replayed without live processes.
 */

use super::machine::SchedulerState;
use super::policy::FeedbackPolicy;
use super::running::RunningEntry;
use crate::core::types::{Nanos, Pid, Slot, Tier};
use crate::monitoring::span_operation;
use crate::process::coordination::{CoordinationBlock, SchedTables};
use crate::process::core::types::RecordState;
use crate::process::execution::ProcessControl;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A job continued during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub pid: Pid,
    pub slot: Slot,
    pub tier: Tier,
}

/// A job stopped and demoted during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preempted {
    pub pid: Pid,
    pub slot: Slot,
    pub from: Tier,
    pub to: Tier,
    pub ran_for: Duration,
}

pub struct Dispatcher<C> {
    policy: FeedbackPolicy,
    control: C,
}

impl<C: ProcessControl> Dispatcher<C> {
    pub fn new(policy: FeedbackPolicy, control: C) -> Self {
        Self { policy, control }
    }

    pub fn policy(&self) -> &FeedbackPolicy {
        &self.policy
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    /// Quantum tick: preempt expired jobs, then refill the running set
    pub fn on_tick(&self, block: &CoordinationBlock, now: Nanos) -> (Vec<Preempted>, Vec<Dispatched>) {
        let preempted = self.preempt_expired(block, now);
        let dispatched = self.dispatch_ready(block, now);
        (preempted, dispatched)
    }

    /// Continue queued jobs, highest tier first, until the running set holds
    /// `parallelism` entries or every queue is empty
    pub fn dispatch_ready(&self, block: &CoordinationBlock, now: Nanos) -> Vec<Dispatched> {
        let span = span_operation("dispatch_ready");
        let _entered = span.enter();
        let mut tables = block.tables.lock();
        let mut dispatched = Vec::new();

        while tables.running.len() < self.policy.parallelism() {
            let Some((tier, slot)) = tables.queues.dequeue_highest_nonempty() else {
                break;
            };

            let pid = match tables.record(slot) {
                Ok(record) if record.is_finished() => {
                    debug!(slot, pid = record.pid, "Skipping finished job left in queue");
                    continue;
                }
                Ok(record) => record.pid,
                Err(e) => {
                    error!(slot, error = %e, "Queued slot has no record");
                    continue;
                }
            };

            if let Err(e) = self.control.resume(pid) {
                warn!(pid, error = %e, "Job vanished before dispatch");
                tables.registry.update(pid, |record| record.retire(now, -1));
                continue;
            }

            if let Err(e) = tables.running.mark_running(RunningEntry::new(slot, pid, now)) {
                error!(pid, error = %e, "Cannot track dispatched job");
                let _ = self.control.pause(pid);
                if let Err(e) = tables.queues.enqueue(tier, slot) {
                    error!(pid, slot, error = %e, "Stopped job is in no queue, tables inconsistent");
                }
                break;
            }

            if let Ok(record) = tables.record_mut(slot) {
                record.state = RecordState::Running;
                record.dispatch_start_ns = now;
                record.dispatches += 1;
            }

            block.stats.inc_dispatched();
            block.state.transition(SchedulerState::Dispatching);
            debug!(pid, slot, tier = tier.level(), "Dispatched job");
            dispatched.push(Dispatched { pid, slot, tier });
        }

        settle(block, &tables);
        dispatched
    }

    /// Count one timer tick, then stop every running job that has used up
    /// its tier quantum, fold the interval, demote one tier and requeue at
    /// the tail
    ///
    /// A job whose lower tier has no room keeps running until the next tick.
    pub fn preempt_expired(&self, block: &CoordinationBlock, now: Nanos) -> Vec<Preempted> {
        let span = span_operation("preempt_expired");
        let _entered = span.enter();
        let mut tables = block.tables.lock();
        tables.running.count_tick();
        let expired = self.expired_entries(&tables);
        let mut preempted = Vec::with_capacity(expired.len());

        for (entry, from) in expired {
            let to = self.policy.demote(from);
            if tables.queues.is_full(to) {
                warn!(pid = entry.pid, tier = to.level(), "No room to requeue, job keeps running");
                continue;
            }

            block.state.transition(SchedulerState::Preempting);

            if let Err(e) = self.control.pause(entry.pid) {
                // Exiting; the reaper reconciles it
                warn!(pid = entry.pid, error = %e, "Failed to pause job");
                continue;
            }

            tables.running.mark_done(entry.pid);
            let Ok(record) = tables.record_mut(entry.slot) else {
                error!(slot = entry.slot, "Running slot has no record");
                continue;
            };

            let ran_for = record.close_interval(now);
            record.tier = to;
            record.state = RecordState::Queued;
            record.preemptions += 1;

            if let Err(e) = tables.queues.enqueue(to, entry.slot) {
                error!(pid = entry.pid, error = %e, "Stopped job is in no queue, tables inconsistent");
                continue;
            }

            block.stats.inc_preemptions();
            info!(
                pid = entry.pid,
                from = from.level(),
                to = to.level(),
                ran_ms = ran_for.as_millis() as u64,
                "Preempted job"
            );
            preempted.push(Preempted {
                pid: entry.pid,
                slot: entry.slot,
                from,
                to,
                ran_for,
            });
        }

        settle(block, &tables);
        preempted
    }

    /// Running entries past their quantum, with the tier they ran at
    fn expired_entries(&self, tables: &SchedTables) -> Vec<(RunningEntry, Tier)> {
        tables
            .running
            .iter()
            .filter_map(|entry| {
                let tier = tables.registry.get(entry.slot)?.tier;
                self.policy
                    .is_expired(tier, entry.ticks)
                    .then_some((*entry, tier))
            })
            .collect()
    }
}

/// Publish Idle or Dispatching depending on the running set
fn settle(block: &CoordinationBlock, tables: &SchedTables) {
    let next = if tables.running.is_empty() {
        SchedulerState::Idle
    } else {
        SchedulerState::Dispatching
    };
    block.state.transition(next);
}

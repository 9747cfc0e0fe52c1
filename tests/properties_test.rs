/*!
 * Scheduler Property Tests
 * Table invariants under random submit, tick and exit sequences
 */

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;
use tiered_sched::core::errors::ProcessResult;
use tiered_sched::core::types::{Nanos, Pid};
use tiered_sched::process::{
    reconcile_exit, CoordinationBlock, Dispatcher, FeedbackPolicy, ProcessControl,
    ProcessControlRecord, RecordState, SchedulerState,
};
use tiered_sched::Tier;

const MS: Nanos = 1_000_000;

struct NoopControl;

impl ProcessControl for NoopControl {
    fn pause(&self, _pid: Pid) -> ProcessResult<()> {
        Ok(())
    }

    fn resume(&self, _pid: Pid) -> ProcessResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Submit(u8),
    Tick(u64),
    Exit(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u8..=4).prop_map(Op::Submit),
        (1u64..120).prop_map(Op::Tick),
        (0usize..64).prop_map(Op::Exit),
    ]
}

proptest! {
    #[test]
    fn prop_tables_stay_consistent(
        cpus in 1usize..4,
        base_ms in 5u64..40,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let block = Box::new(CoordinationBlock::new());
        block.state.transition(SchedulerState::Idle);
        let dispatcher = Dispatcher::new(
            FeedbackPolicy::new(Duration::from_millis(base_ms), cpus),
            NoopControl,
        );

        let mut now: Nanos = 0;
        let mut next_pid: Pid = 1000;
        let mut submitted: Vec<Pid> = Vec::new();

        for op in ops {
            match op {
                Op::Submit(level) => {
                    let record = ProcessControlRecord::new(
                        next_pid,
                        "job",
                        Tier::new(level).unwrap(),
                        now,
                    );
                    block.tables.lock().admit(record).unwrap();
                    submitted.push(next_pid);
                    next_pid += 1;
                    dispatcher.dispatch_ready(&block, now);
                }
                Op::Tick(ms) => {
                    now += ms * MS;
                    dispatcher.on_tick(&block, now);
                }
                Op::Exit(index) => {
                    if !submitted.is_empty() {
                        let pid = submitted[index % submitted.len()];
                        reconcile_exit(&block, pid, 0, now);
                        dispatcher.dispatch_ready(&block, now);
                    }
                }
            }

            let tables = block.tables.lock();
            prop_assert!(tables.is_consistent());
            prop_assert!(tables.running.len() <= cpus);

            let running: HashSet<Pid> = tables.running.iter().map(|entry| entry.pid).collect();
            prop_assert_eq!(running.len(), tables.running.len());

            // Work conservation: nothing waits while a processor is free
            if tables.running.len() < cpus {
                prop_assert!(tables.queues.is_empty());
            }

            for record in tables.registry.iter() {
                prop_assert!(record.execution_ns <= now.saturating_sub(record.submitted_ns));
                if record.state == RecordState::Finished {
                    prop_assert!(!running.contains(&record.pid));
                }
            }
        }
    }

    #[test]
    fn prop_tiers_only_move_down(
        base_ms in 1u64..20,
        ticks in prop::collection::vec(1u64..200, 1..40),
    ) {
        let block = Box::new(CoordinationBlock::new());
        block.state.transition(SchedulerState::Idle);
        let dispatcher = Dispatcher::new(
            FeedbackPolicy::new(Duration::from_millis(base_ms), 1),
            NoopControl,
        );
        for pid in 1..=3 {
            let record = ProcessControlRecord::new(pid, "job", Tier::HIGHEST, 0);
            block.tables.lock().admit(record).unwrap();
        }

        let mut now = 0;
        let mut last = [Tier::HIGHEST; 3];
        dispatcher.dispatch_ready(&block, now);
        for ms in ticks {
            now += ms * MS;
            let (preempted, _) = dispatcher.on_tick(&block, now);
            for event in preempted {
                prop_assert_eq!(event.to, event.from.demoted());
            }

            let tables = block.tables.lock();
            for (index, pid) in (1..=3).enumerate() {
                let tier = tables.registry.find(pid).unwrap().tier;
                prop_assert!(tier >= last[index]);
                last[index] = tier;
            }
        }
    }
}

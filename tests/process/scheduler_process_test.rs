/*!
 * Scheduler Process Tests
 * A forked scheduler driven through run and pause with a real job
 */

use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid as NixPid;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};
use tiered_sched::core::clock::monotonic_ns;
use tiered_sched::core::config::SchedulerConfig;
use tiered_sched::process::lifecycle::wake_scheduler;
use tiered_sched::process::{
    reconcile_exit, Coordination, ForkLauncher, JobController, Reconciliation, RecordState,
    SchedulerHandle, SchedulerState,
};

fn wait_for_state(coordination: &Coordination, expected: SchedulerState) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while coordination.state.get() != expected {
        assert!(Instant::now() < deadline, "scheduler never reached {:?}", expected);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
#[serial]
fn test_run_dispatches_job_then_pause_parks_scheduler() {
    let coordination = Coordination::create().unwrap();
    // Long slice: the job finishes well before the first tick
    let config = SchedulerConfig::new(1, 5_000).unwrap();
    let mut handle = SchedulerHandle::launch(coordination.clone(), config).unwrap();
    assert!(handle.is_suspended());
    assert_eq!(coordination.scheduler_pid(), Some(handle.pid()));

    let jobs = JobController::new(coordination.clone(), ForkLauncher);
    let pid = jobs.submit("true", None).unwrap();
    assert_eq!(
        coordination.tables.lock().registry.find(pid).unwrap().state,
        RecordState::Queued
    );

    handle.resume().unwrap();
    assert!(!handle.is_suspended());
    let status = waitpid(NixPid::from_raw(pid), None).unwrap();
    assert_eq!(status, WaitStatus::Exited(NixPid::from_raw(pid), 0));

    let outcome = reconcile_exit(&coordination, pid, 0, monotonic_ns());
    assert!(matches!(outcome, Reconciliation::Running { .. }));
    {
        let tables = coordination.tables.lock();
        let record = tables.registry.find(pid).unwrap();
        assert_eq!(record.state, RecordState::Finished);
        assert_eq!(record.dispatches, 1);
        assert_eq!(record.preemptions, 0);
        assert!(tables.running.is_empty());
    }

    wake_scheduler(&coordination);
    wait_for_state(&coordination, SchedulerState::Idle);
    assert_eq!(coordination.stats_snapshot().dispatched, 1);

    handle.suspend().unwrap();
    assert!(handle.is_suspended());
    assert_eq!(coordination.state.get(), SchedulerState::Suspended);

    handle.terminate();
}

#[test]
#[serial]
fn test_paused_scheduler_dispatches_nothing() {
    let coordination = Coordination::create().unwrap();
    let config = SchedulerConfig::new(1, 5_000).unwrap();
    let handle = SchedulerHandle::launch(coordination.clone(), config).unwrap();

    let jobs = JobController::new(coordination.clone(), ForkLauncher);
    let pid = jobs.submit("true", None).unwrap();
    thread::sleep(Duration::from_millis(50));

    {
        let tables = coordination.tables.lock();
        let record = tables.registry.find(pid).unwrap();
        assert_eq!(record.state, RecordState::Queued);
        assert_eq!(record.dispatches, 0);
    }
    assert_eq!(coordination.state.get(), SchedulerState::Suspended);

    // Kills the parked job along with the scheduler
    handle.terminate();
}

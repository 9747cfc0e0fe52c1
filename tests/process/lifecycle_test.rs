/*!
 * Job Lifecycle Tests
 * Submission through the shared block, capacity limits and exit reconciliation
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::cell::{Cell, RefCell};
use std::path::Path;
use tiered_sched::core::errors::{KernelError, ProcessError, ProcessResult, SchedulerError};
use tiered_sched::core::limits::MAX_JOBS;
use tiered_sched::core::types::Pid;
use tiered_sched::process::lifecycle::{resolve_executable, spawn_parked};
use tiered_sched::process::{
    reconcile_exit, Coordination, JobController, JobLauncher, ProcessControl, Reconciliation,
    RecordState, SignalControl,
};
use tiered_sched::Tier;

/// Hands out increasing fake pids without forking
struct FakeLauncher {
    next: Cell<Pid>,
    discarded: RefCell<Vec<Pid>>,
}

impl FakeLauncher {
    fn new() -> Self {
        Self {
            next: Cell::new(5000),
            discarded: RefCell::new(Vec::new()),
        }
    }
}

impl JobLauncher for FakeLauncher {
    fn launch(&self, _path: &Path) -> ProcessResult<Pid> {
        let pid = self.next.get();
        self.next.set(pid + 1);
        Ok(pid)
    }

    fn discard(&self, pid: Pid) {
        self.discarded.borrow_mut().push(pid);
    }
}

fn controller() -> JobController<FakeLauncher> {
    let coordination = Coordination::create().unwrap();
    JobController::new(coordination, FakeLauncher::new())
}

#[test]
fn test_submit_defaults_to_highest_tier() {
    let jobs = controller();
    let pid = jobs.submit("true", None).unwrap();

    let tables = jobs.coordination().tables.lock();
    let record = tables.registry.find(pid).unwrap();
    assert_eq!(record.tier, Tier::HIGHEST);
    assert_eq!(record.state, RecordState::Queued);
    assert_eq!(record.name.as_str(), "true");
    assert_eq!(tables.queues.peek_highest().map(|(tier, _)| tier), Some(Tier::HIGHEST));
}

#[test]
fn test_submit_with_explicit_tier() {
    let jobs = controller();
    let tier = Tier::new(3).unwrap();
    let pid = jobs.submit("true", Some(tier)).unwrap();

    let tables = jobs.coordination().tables.lock();
    assert_eq!(tables.registry.find(pid).unwrap().tier, tier);
    assert_eq!(tables.queues.len(tier), 1);
    assert_eq!(jobs.coordination().stats_snapshot().submitted, 1);
}

#[test]
fn test_submit_unknown_program_fails() {
    let jobs = controller();
    let err = jobs.submit("definitely-not-a-real-program-xyz", None).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Process(ProcessError::NotExecutable(_))
    ));
    assert!(jobs.coordination().tables.lock().registry.is_empty());
}

#[test]
fn test_registry_overflow_keeps_earlier_jobs() {
    let jobs = controller();
    let pids: Vec<Pid> = (0..MAX_JOBS)
        .map(|_| jobs.submit("true", None).unwrap())
        .collect();

    let err = jobs.submit("true", None).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Scheduler(SchedulerError::RegistryFull { .. })
    ));

    let tables = jobs.coordination().tables.lock();
    assert_eq!(tables.registry.len(), MAX_JOBS);
    assert!(pids.iter().all(|&pid| tables.registry.find(pid).is_some()));
    assert!(tables.is_consistent());
}

#[test]
fn test_exit_reconciled_once() {
    let jobs = controller();
    let pid = jobs.submit("true", None).unwrap();
    let block = jobs.coordination();

    assert!(matches!(
        reconcile_exit(block, pid, 3, 1_000),
        Reconciliation::Queued { .. }
    ));
    assert_eq!(
        reconcile_exit(block, pid, 3, 2_000),
        Reconciliation::AlreadyFinished
    );

    let tables = block.tables.lock();
    let record = tables.registry.find(pid).unwrap();
    assert_eq!(record.state, RecordState::Finished);
    assert_eq!(record.exit_status, 3);
    assert!(tables.queues.is_empty());
    assert_eq!(block.stats_snapshot().completed, 1);
}

#[test]
#[serial]
fn test_parked_job_runs_after_continue() {
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd::Pid as NixPid;

    let coordination = Coordination::create().unwrap();
    let path = resolve_executable("true").unwrap();
    let pid = spawn_parked(&path).unwrap();
    let record = tiered_sched::process::ProcessControlRecord::new(pid, "true", Tier::HIGHEST, 0);
    coordination.tables.lock().admit(record).unwrap();

    SignalControl.resume(pid).unwrap();
    let status = waitpid(NixPid::from_raw(pid), None).unwrap();
    assert_eq!(status, WaitStatus::Exited(NixPid::from_raw(pid), 0));

    let outcome = reconcile_exit(&coordination, pid, 0, 1_000_000);
    assert!(matches!(outcome, Reconciliation::Queued { .. }));
    assert!(coordination.tables.lock().registry.find(pid).unwrap().is_finished());
}

#[test]
#[serial]
fn test_signalling_reaped_job_fails() {
    use nix::sys::wait::waitpid;
    use nix::unistd::Pid as NixPid;

    let path = resolve_executable("true").unwrap();
    let pid = spawn_parked(&path).unwrap();
    SignalControl.resume(pid).unwrap();
    waitpid(NixPid::from_raw(pid), None).unwrap();

    assert!(SignalControl.pause(pid).is_err());
}

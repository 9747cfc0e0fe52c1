/*!
 * Scheduler Supervisor
 * Shell-side control of the scheduler process: fork, stop, continue, kill
 */

use super::spawn::wait_until_stopped;
use crate::core::config::SchedulerConfig;
use crate::core::errors::{KernelError, ProcessError, ProcessResult};
use crate::core::types::{KernelResult, Pid};
use crate::process::coordination::{Coordination, CoordinationBlock};
use crate::process::execution::send_signal;
use crate::process::scheduler::{run_scheduler_process, SchedulerState};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::waitpid;
use nix::unistd::{fork, ForkResult, Pid as NixPid};
use tracing::{debug, error, info, warn};

/// Nudge the scheduler to re-evaluate its queues (SIGUSR1)
///
/// Harmless while the scheduler is stopped: the signal stays pending until
/// it is continued. A no-op before the scheduler exists.
pub fn wake_scheduler(block: &CoordinationBlock) {
    let Some(pid) = block.scheduler_pid() else {
        return;
    };
    if let Err(e) = send_signal(pid, Signal::SIGUSR1) {
        warn!(error = %e, "Failed to wake scheduler");
    }
}

/// Handle to the forked scheduler process
pub struct SchedulerHandle {
    pid: Pid,
    coordination: Coordination,
    suspended: bool,
}

impl SchedulerHandle {
    /// Fork the scheduler process and wait until it has parked itself
    ///
    /// Must be called while the shell is still single-threaded, before its
    /// async runtime starts.
    pub fn launch(coordination: Coordination, config: SchedulerConfig) -> KernelResult<Self> {
        // SAFETY: the caller guarantees no other thread exists yet
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                let code = match run_scheduler_process(coordination, config) {
                    Ok(()) => 0,
                    Err(e) => {
                        error!(error = %e, "Scheduler process failed");
                        1
                    }
                };
                std::process::exit(code)
            }
            Ok(ForkResult::Parent { child }) => {
                let pid = child.as_raw();
                if let Err(e) = wait_until_stopped(pid) {
                    return Err(KernelError::SignalInstall(format!(
                        "scheduler did not come up: {}",
                        e
                    )));
                }

                coordination.set_scheduler_pid(pid);
                info!(pid, "Scheduler process parked");
                Ok(Self {
                    pid,
                    coordination,
                    suspended: true,
                })
            }
            Err(e) => Err(ProcessError::SpawnFailed(format!("scheduler fork: {}", e)).into()),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// `run`: arm or re-arm the quantum timer and continue the scheduler
    pub fn resume(&mut self) -> ProcessResult<()> {
        let generation = self.coordination.request_run();
        if self.suspended {
            send_signal(self.pid, Signal::SIGCONT)?;
            self.suspended = false;
        }
        send_signal(self.pid, Signal::SIGUSR1)?;
        info!(generation, "Scheduler running");
        Ok(())
    }

    /// `pause`: stop the scheduler while holding the table lock
    ///
    /// The stop is confirmed before the lock is released, so the scheduler
    /// cannot be frozen between acquiring and releasing it. Running jobs keep
    /// running; nothing new is dispatched or preempted until `run`.
    pub fn suspend(&mut self) -> ProcessResult<()> {
        if self.suspended {
            debug!("Scheduler already suspended");
            return Ok(());
        }

        let guard = self.coordination.tables.lock();
        send_signal(self.pid, Signal::SIGSTOP)?;
        wait_until_stopped(self.pid)?;
        self.coordination.state.transition(SchedulerState::Suspended);
        drop(guard);

        self.suspended = true;
        info!("Scheduler suspended");
        Ok(())
    }

    /// Kill the scheduler and every job that has not finished
    pub fn terminate(self) {
        let pids: Vec<Pid> = self
            .coordination
            .tables
            .lock()
            .registry
            .unfinished()
            .map(|record| record.pid)
            .collect();

        for pid in std::iter::once(self.pid).chain(pids.iter().copied()) {
            match send_signal(pid, Signal::SIGKILL) {
                Ok(()) => reap(pid),
                Err(e) => debug!(pid, error = %e, "Process already gone"),
            }
        }
        info!(jobs = pids.len(), "Scheduler and unfinished jobs terminated");
    }
}

fn reap(pid: Pid) {
    loop {
        match waitpid(NixPid::from_raw(pid), None) {
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) | Ok(_) => return,
            Err(e) => {
                warn!(pid, error = %e, "waitpid failed");
                return;
            }
        }
    }
}

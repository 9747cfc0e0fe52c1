/*!
 * Interactive Loop
 *
 * Reads commands from stdin while reacting to SIGCHLD (reconciliation) and
 * SIGINT (summary and exit). Everything runs on one thread; a foreground
 * command is awaited inside its own branch, so the reaper never collects a
 * child that tokio is still waiting on.
 */

use super::command::ShellCommand;
use super::history::History;
use super::summary::{render_jobs, render_jobs_json, render_summary};
use crate::core::clock::monotonic_ns;
use crate::core::limits::{HISTORY_CAPACITY, SHELL_PROMPT};
use crate::core::types::{KernelResult, Pid, Tier};
use crate::process::coordination::Coordination;
use crate::process::core::types::ProcessControlRecord;
use crate::process::lifecycle::{
    drain_exits, reconcile_exit, wake_scheduler, ForkLauncher, JobController, Reconciliation,
    SchedulerHandle,
};
use crate::signals::ShellSignals;
use time::OffsetDateTime;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    coordination: Coordination,
    jobs: JobController<ForkLauncher>,
    scheduler: SchedulerHandle,
    history: History,
}

impl Shell {
    pub fn new(coordination: Coordination, scheduler: SchedulerHandle) -> Self {
        Self {
            jobs: JobController::new(coordination.clone(), ForkLauncher),
            coordination,
            scheduler,
            history: History::new(HISTORY_CAPACITY),
        }
    }

    /// Run until `exit`, end of input or Ctrl-C, then print the summary and
    /// tear down the scheduler and any unfinished jobs
    pub async fn run(mut self) -> KernelResult<()> {
        let mut signals = ShellSignals::install()?;
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        prompt(&mut stdout).await?;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("End of input");
                        break;
                    };
                    if self.execute(&line).await == Flow::Exit {
                        break;
                    }
                    prompt(&mut stdout).await?;
                }

                Some(()) = signals.child.recv() => {
                    self.reconcile_children();
                }

                Some(()) = signals.interrupt.recv() => {
                    println!("\nCtrl + C pressed");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    async fn execute(&mut self, line: &str) -> Flow {
        let command = match ShellCommand::parse(line) {
            Ok(ShellCommand::Empty) => return Flow::Continue,
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                return Flow::Continue;
            }
        };

        let index = self.history.begin(line.trim(), OffsetDateTime::now_utc());
        match command {
            ShellCommand::Submit { program, tier } => {
                self.submit(index, &program, tier);
                return Flow::Continue;
            }
            ShellCommand::External { program, args } => {
                if let Some(pid) = run_foreground(&program, &args).await {
                    self.history.set_pid(index, pid);
                }
            }
            ShellCommand::Run => {
                match self.scheduler.resume() {
                    Ok(()) => println!("Starting the scheduler"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            ShellCommand::Pause => {
                if self.scheduler.is_suspended() {
                    println!("Scheduler is not running");
                } else if let Err(e) = self.scheduler.suspend() {
                    eprintln!("{}", e);
                }
            }
            ShellCommand::Jobs { json: true } => match render_jobs_json(&self.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!(error = %e, "Failed to serialise job reports"),
            },
            ShellCommand::Jobs { json: false } => {
                let records = self.snapshot();
                print!(
                    "{}",
                    render_jobs(
                        &records,
                        self.coordination.state.get(),
                        &self.coordination.stats_snapshot()
                    )
                );
            }
            ShellCommand::Exit => {
                self.history.complete(index, OffsetDateTime::now_utc());
                return Flow::Exit;
            }
            ShellCommand::Empty => {}
        }

        self.history.complete(index, OffsetDateTime::now_utc());
        Flow::Continue
    }

    fn submit(&mut self, index: Option<usize>, program: &str, tier: Option<Tier>) {
        match self.jobs.submit(program, tier) {
            Ok(pid) => {
                // Completed when the job exits
                self.history.set_pid(index, pid);
                println!("Submitted {} (pid {})", program, pid);
            }
            Err(e) => {
                self.history.complete(index, OffsetDateTime::now_utc());
                eprintln!("{}", e);
            }
        }
    }

    fn reconcile_children(&mut self) {
        let exits = drain_exits();
        if exits.is_empty() {
            return;
        }

        let scheduler_pid = self.scheduler.pid();
        let mut retired = 0usize;
        for exit in exits {
            if exit.pid == scheduler_pid {
                error!(status = exit.status, "Scheduler process exited");
                eprintln!("scheduler process exited (status {})", exit.status);
                continue;
            }

            match reconcile_exit(&self.coordination, exit.pid, exit.status, monotonic_ns()) {
                Reconciliation::Running { .. } | Reconciliation::Queued { .. } => {
                    retired += 1;
                    if let Some(name) = self.job_name(exit.pid) {
                        println!("Process terminated: {}", name);
                    }
                }
                outcome => debug!(pid = exit.pid, ?outcome, "Exit ignored"),
            }

            self.history.stamp_exit(exit.pid, OffsetDateTime::now_utc());
        }

        if retired > 0 {
            wake_scheduler(&self.coordination);
        }
    }

    fn job_name(&self, pid: Pid) -> Option<String> {
        self.coordination
            .tables
            .lock()
            .registry
            .find(pid)
            .map(|record| record.name.to_string())
    }

    fn snapshot(&self) -> Vec<ProcessControlRecord> {
        self.coordination.tables.lock().registry.iter().copied().collect()
    }

    fn shutdown(mut self) {
        // Collect anything that finished since the last SIGCHLD was handled
        self.reconcile_children();

        let records = self.snapshot();
        print!("{}", render_summary(&records, &self.history));
        self.scheduler.terminate();
    }
}

async fn prompt(stdout: &mut io::Stdout) -> KernelResult<()> {
    stdout.write_all(SHELL_PROMPT.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Run a command synchronously; returns its pid if it started
async fn run_foreground(program: &str, args: &[String]) -> Option<Pid> {
    let mut child = match Command::new(program).args(args).spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(program, error = %e, "Foreground spawn failed");
            println!("{}: command not found", program);
            return None;
        }
    };

    let pid = child.id().map(|id| id as Pid);
    match child.wait().await {
        Ok(status) if !status.success() => debug!(program, %status, "Foreground command failed"),
        Ok(_) => {}
        Err(e) => warn!(program, error = %e, "Waiting for foreground command failed"),
    }
    pid
}

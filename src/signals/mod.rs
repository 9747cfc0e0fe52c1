/*!
 * Signals Module
 *
 * Signal streams for the shell and the scheduler process. Installation goes
 * through tokio's signal driver, whose handlers only set a flag and write to
 * a self-pipe; all reconciliation and scheduling happens in the async loops
 * that poll these streams.
 */

use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::debug;

fn install(kind: SignalKind, name: &'static str) -> KernelResult<Signal> {
    let stream = signal(kind)
        .map_err(|e| KernelError::SignalInstall(format!("{}: {}", name, e)))?;
    debug!(signal = name, "Signal handler installed");
    Ok(stream)
}

/// Streams consumed by the scheduler loop
pub struct SchedulerSignals {
    /// Quantum tick from the POSIX timer
    pub alarm: Signal,
    /// Wake-up from the shell: work was submitted, finished, or `run` issued
    pub wake: Signal,
}

impl SchedulerSignals {
    /// Must run inside the scheduler's runtime, before it stops itself
    pub fn install() -> KernelResult<Self> {
        Ok(Self {
            alarm: install(SignalKind::alarm(), "SIGALRM")?,
            wake: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }
}

/// Streams consumed by the shell loop
pub struct ShellSignals {
    /// A child exited, was killed, stopped or continued
    pub child: Signal,
    pub interrupt: Signal,
}

impl ShellSignals {
    pub fn install() -> KernelResult<Self> {
        Ok(Self {
            child: install(SignalKind::child(), "SIGCHLD")?,
            interrupt: install(SignalKind::interrupt(), "SIGINT")?,
        })
    }
}

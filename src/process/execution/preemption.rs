/*!
 * Preemptive Scheduling Integration
 *
 * Bridges scheduling decisions with OS-level process control: jobs are
 * paused with SIGSTOP and resumed with SIGCONT.
 */

use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Pid;
use nix::sys::signal::{kill, Signal as UnixSignal};
use nix::unistd::Pid as NixPid;
use tracing::debug;

/// Stop/continue capability driven by the dispatcher
///
/// The real implementation signals OS processes; tests substitute a recorder
/// so scheduling decisions can be checked without live processes.
pub trait ProcessControl {
    /// Stop a running job (SIGSTOP)
    fn pause(&self, pid: Pid) -> ProcessResult<()>;

    /// Continue a parked job (SIGCONT)
    fn resume(&self, pid: Pid) -> ProcessResult<()>;
}

/// Process control through real signals
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalControl;

impl SignalControl {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for SignalControl {
    fn pause(&self, pid: Pid) -> ProcessResult<()> {
        send_signal(pid, UnixSignal::SIGSTOP)?;
        debug!(pid, "Paused job");
        Ok(())
    }

    fn resume(&self, pid: Pid) -> ProcessResult<()> {
        send_signal(pid, UnixSignal::SIGCONT)?;
        debug!(pid, "Resumed job");
        Ok(())
    }
}

/// Deliver `signal` to `pid`, mapping failures to [`ProcessError::SignalFailed`]
pub fn send_signal(pid: Pid, signal: UnixSignal) -> ProcessResult<()> {
    kill(NixPid::from_raw(pid), signal).map_err(|e| ProcessError::SignalFailed {
        pid,
        signal: signal.as_str().to_string(),
        reason: e.to_string(),
    })
}

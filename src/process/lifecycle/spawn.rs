/*!
 * Job Spawning
 *
 * Fork a job that parks itself with SIGSTOP before exec, and confirm the
 * stop from the parent. The job therefore never runs user code until the
 * scheduler continues it.
 */

use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::limits::EXEC_FAILURE_STATUS;
use crate::core::types::Pid;
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid as NixPid};
use std::env;
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::{debug, warn};

/// Creates parked job processes
///
/// The shell uses [`ForkLauncher`]; tests substitute a launcher that hands
/// out fake pids.
pub trait JobLauncher {
    /// Start `path` stopped and return its pid once the stop is confirmed
    fn launch(&self, path: &Path) -> ProcessResult<Pid>;

    /// Kill and reap a parked job that could not be admitted
    fn discard(&self, pid: Pid);
}

/// Launcher forking real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkLauncher;

impl JobLauncher for ForkLauncher {
    fn launch(&self, path: &Path) -> ProcessResult<Pid> {
        spawn_parked(path)
    }

    fn discard(&self, pid: Pid) {
        let target = NixPid::from_raw(pid);
        if let Err(e) = kill(target, Signal::SIGKILL) {
            warn!(pid, error = %e, "Failed to kill rejected job");
            return;
        }
        if let Err(e) = waitpid(target, None) {
            warn!(pid, error = %e, "Failed to reap rejected job");
        }
    }
}

/// Resolve `program` to an executable file
///
/// Names containing a slash are taken as paths; bare names are searched on
/// `PATH` like execvp would.
pub fn resolve_executable(program: &str) -> ProcessResult<PathBuf> {
    if program.is_empty() {
        return Err(ProcessError::NotExecutable(program.to_string()));
    }

    if program.contains('/') {
        let path = PathBuf::from(program);
        return if is_executable(&path) {
            Ok(path)
        } else {
            Err(ProcessError::NotExecutable(program.to_string()))
        };
    }

    env::var_os("PATH")
        .and_then(|paths| {
            env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| is_executable(candidate))
        })
        .ok_or_else(|| ProcessError::NotExecutable(program.to_string()))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Fork `path`, stopped before exec
///
/// argv is built before forking: the child only calls raise, execv and
/// _exit, which are async-signal-safe even though the shell is
/// multi-threaded.
pub fn spawn_parked(path: &Path) -> ProcessResult<Pid> {
    let program = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| ProcessError::NotExecutable(path.display().to_string()))?;
    let argv = [program.as_ptr(), ptr::null()];

    // SAFETY: the child runs only async-signal-safe libc calls before exec
    match unsafe { fork() } {
        Ok(ForkResult::Child) => unsafe {
            libc::raise(libc::SIGSTOP);
            libc::execv(program.as_ptr(), argv.as_ptr());
            libc::_exit(EXEC_FAILURE_STATUS)
        },
        Ok(ForkResult::Parent { child }) => {
            wait_until_stopped(child.as_raw())?;
            debug!(pid = child.as_raw(), path = %path.display(), "Job parked");
            Ok(child.as_raw())
        }
        Err(e) => Err(ProcessError::SpawnFailed(format!(
            "fork for {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Block until `pid` reports a stop
pub fn wait_until_stopped(pid: Pid) -> ProcessResult<()> {
    let target = NixPid::from_raw(pid);
    loop {
        match waitpid(target, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Stopped(_, _)) => return Ok(()),
            Ok(WaitStatus::Exited(_, code)) => {
                return Err(ProcessError::SpawnFailed(format!(
                    "process {} exited with status {} before stopping",
                    pid, code
                )))
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Err(ProcessError::SpawnFailed(format!(
                    "process {} killed by {} before stopping",
                    pid, signal
                )))
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => {
                return Err(ProcessError::SpawnFailed(format!(
                    "waitpid({}): {}",
                    pid, e
                )))
            }
        }
    }
}

/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job creation and process control errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Invalid command: {0}")]
    #[diagnostic(
        code(process::invalid_command),
        help("Use `submit <path> [priority]`, `run`, `pause`, `jobs` or `exit`.")
    )]
    InvalidCommand(String),

    #[error("Invalid priority: {0}")]
    #[diagnostic(
        code(process::invalid_priority),
        help("Priority must be an integer tier between 1 (highest) and 4 (lowest).")
    )]
    InvalidPriority(String),

    #[error("Not an executable: {0}")]
    #[diagnostic(
        code(process::not_executable),
        help("Give a path to an executable file or a program name found on PATH.")
    )]
    NotExecutable(String),

    #[error("Spawn failed: {0}")]
    #[diagnostic(
        code(process::spawn_failed),
        help("Check system resources (process limits, memory). The shell keeps running.")
    )]
    SpawnFailed(String),

    #[error("Failed to send {signal} to process {pid}: {reason}")]
    #[diagnostic(
        code(process::signal_failed),
        help("The process may already have exited.")
    )]
    SignalFailed {
        pid: Pid,
        signal: String,
        reason: String,
    },
}

/// Scheduler table errors (resource exhaustion and invariant violations)
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Process registry full: {capacity} jobs already submitted")]
    #[diagnostic(
        code(scheduler::registry_full),
        help("The registry never frees slots. Restart the shell to submit more jobs.")
    )]
    RegistryFull { capacity: usize },

    #[error("Ready queue for tier {tier} full ({capacity} entries)")]
    #[diagnostic(
        code(scheduler::queue_full),
        help("Too many jobs waiting at this tier. Wait for jobs to complete.")
    )]
    QueueFull { tier: u8, capacity: usize },

    #[error("Running set full ({capacity} entries)")]
    #[diagnostic(code(scheduler::running_set_full))]
    RunningSetFull { capacity: usize },

    #[error("Registry slot {0} is not populated")]
    #[diagnostic(
        code(scheduler::unknown_slot),
        help("A queue referenced a record that was never registered. This is a bug.")
    )]
    UnknownSlot(u32),
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Signal installation failed: {0}")]
    #[diagnostic(
        code(kernel::signal_install),
        help("Every handler must be active before jobs are accepted.")
    )]
    SignalInstall(String),

    #[error("Shared memory setup failed: {0}")]
    #[diagnostic(
        code(kernel::shared_memory),
        help("Anonymous shared mappings are required to coordinate with the scheduler process.")
    )]
    SharedMemory(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Usage: tiered-sched <NCPU> <TSLICE_MS> (both positive integers).")
    )]
    Configuration(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(kernel::io_error))]
    Io(String),

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(kernel::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(String),
}

impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::Io(err.to_string())
    }
}

impl From<String> for KernelError {
    fn from(msg: String) -> Self {
        KernelError::Internal(msg)
    }
}

impl From<&str> for KernelError {
    fn from(msg: &str) -> Self {
        KernelError::Internal(msg.to_string())
    }
}

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, KernelError>;

/// Result type for process control and job creation
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

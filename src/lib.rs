/*!
 * Tiered Scheduler Library
 * A four-tier feedback scheduler for real OS processes, driven from a shell
 */

pub mod core;
pub mod ipc;
pub mod monitoring;
pub mod process;
pub mod shell;
pub mod signals;

// Re-exports
pub use crate::core::errors::{KernelError, ProcessError, SchedulerError};
pub use crate::core::{KernelResult, SchedulerConfig, Tier};
pub use monitoring::init_tracing;
pub use process::{Coordination, JobController, SchedulerHandle};
pub use shell::Shell;

/*!
 * Job Lifecycle
 * Spawning parked jobs, submission, exit reconciliation and scheduler control
 */

pub mod reaper;
pub mod spawn;
pub mod submit;
pub mod supervisor;

pub use reaper::{drain_exits, reconcile_exit, ExitReport, Reconciliation};
pub use spawn::{resolve_executable, spawn_parked, wait_until_stopped, ForkLauncher, JobLauncher};
pub use submit::JobController;
pub use supervisor::{wake_scheduler, SchedulerHandle};

/*!
 * Process Module
 * Job records, the shared registry, the scheduler and the job lifecycle
 */

pub mod coordination;
pub mod core;
pub mod execution;
pub mod lifecycle;
pub mod registry;
pub mod scheduler;

// Re-export for convenience
pub use self::core::{InlineName, JobReport, ProcessControlRecord, RecordState};
pub use coordination::{Coordination, CoordinationBlock, SchedTables};
pub use execution::{ProcessControl, QuantumTimer, SignalControl};
pub use lifecycle::{
    drain_exits, reconcile_exit, ExitReport, ForkLauncher, JobController, JobLauncher,
    Reconciliation, SchedulerHandle,
};
pub use registry::Registry;
pub use scheduler::{
    Dispatcher, FeedbackPolicy, ReadyQueues, RunningEntry, RunningSet, SchedulerState,
    SchedulerStats,
};

/*!
 * Tiered Feedback Scheduler
 *
 * Four FIFO ready queues, a running set bounded by the processor count, and
 * a dispatcher that demotes a job one tier each time it exhausts its
 * quantum. The tables live in the shared coordination block; the loop runs
 * in its own process.
 */

pub mod atomic_stats;
pub mod dispatch;
pub mod machine;
pub mod policy;
pub mod queues;
pub mod running;
pub mod task;

pub use atomic_stats::{AtomicSchedulerStats, SchedulerStats};
pub use dispatch::{Dispatched, Dispatcher, Preempted};
pub use machine::{SchedulerState, StateCell};
pub use policy::FeedbackPolicy;
pub use queues::{ReadyQueues, RingQueue};
pub use running::{RunningEntry, RunningSet};
pub use task::{run_scheduler_loop, run_scheduler_process};

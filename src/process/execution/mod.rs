/*!
 * Process Execution
 * OS-level stop/continue control and the quantum timer
 */

pub mod preemption;
pub mod timer;

pub use preemption::{send_signal, ProcessControl, SignalControl};
pub use timer::QuantumTimer;

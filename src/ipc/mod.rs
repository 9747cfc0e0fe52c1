/*!
 * IPC Module
 * Inter-process communication between the shell and the scheduler process
 */

pub mod shm;

// Re-export for convenience
pub use shm::{ShmMutex, ShmMutexGuard, ShmRegion, ShmSafe};

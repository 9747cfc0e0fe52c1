/*!
 * Shared Memory Module
 * Fork-shared mappings and the lock that guards them
 */

mod lock;
mod region;

// Re-export public API
pub use lock::{ShmMutex, ShmMutexGuard};
pub use region::{ShmRegion, ShmSafe};

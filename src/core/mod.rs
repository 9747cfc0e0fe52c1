/*!
 * Core Module
 * Fundamental types, limits, configuration and error handling
 */

pub mod clock;
pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use clock::{elapsed, monotonic_ns};
pub use config::SchedulerConfig;
pub use errors::*;
pub use types::*;

/*!
 * Process Core
 * Record types shared by every process component
 */

pub mod types;

pub use types::{InlineName, JobReport, ProcessControlRecord, RecordState};

/*!
 * Monitoring
 * Structured logging for the shell and scheduler processes
 */

mod tracer;

pub use tracer::{init_tracing, span_operation, OperationSpan};

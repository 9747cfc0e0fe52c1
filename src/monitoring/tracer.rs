/*!
 * Structured Tracing
 * Tracing setup and timed operation spans for scheduler hot paths
 *
 * Features:
 * - JSON-formatted logs for structured parsing (opt-in)
 * - Human-readable compact logs on stderr, keeping stdout for the shell
 * - Operation spans that flag slow critical sections
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Operations slower than this are logged at WARN
const SLOW_OPERATION: Duration = Duration::from_millis(5);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SCHED_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SCHED_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(pid = std::process::id(), json = use_json, "Structured tracing initialized");
    }
}

/// Timed span around a scheduler operation
///
/// Logs completion at DEBUG, or at WARN when the operation exceeded
/// [`SLOW_OPERATION`] (usually a sign of lock contention between processes).
pub struct OperationSpan {
    span: tracing::Span,
    operation: &'static str,
    start: Instant,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "operation",
            operation = operation,
            pid = std::process::id(),
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            operation,
            start: Instant::now(),
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration > SLOW_OPERATION {
            warn!(
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow scheduler operation"
            );
        } else {
            debug!(
                operation = self.operation,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

/// Convenience constructor for operation spans
#[inline]
pub fn span_operation(operation: &'static str) -> OperationSpan {
    OperationSpan::new(operation)
}

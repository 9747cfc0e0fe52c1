/*!
 * Monotonic Clock
 * System-wide timestamps comparable between the shell and scheduler processes
 */

use super::types::Nanos;
use nix::time::{clock_gettime, ClockId};
use std::time::Duration;

/// Current CLOCK_MONOTONIC reading in nanoseconds
///
/// CLOCK_MONOTONIC is shared by every process on the host, so a timestamp
/// taken by the scheduler can be subtracted from one taken by the shell.
#[inline]
#[must_use]
pub fn monotonic_ns() -> Nanos {
    clock_gettime(ClockId::CLOCK_MONOTONIC)
        .map(|ts| Duration::from(ts).as_nanos() as Nanos)
        .unwrap_or_default()
}

/// Elapsed time between two monotonic readings, zero if they are reversed
#[inline]
#[must_use]
pub fn elapsed(start: Nanos, end: Nanos) -> Duration {
    Duration::from_nanos(end.saturating_sub(start))
}

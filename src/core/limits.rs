/*!
 * System Limits and Constants
 *
 * Centralized location for the compile-time bounds of the shared scheduling
 * tables and the shell front-end.
 *
 * ## Design Philosophy
 * - Every table living in shared memory has a fixed capacity known at compile time
 * - Values are grouped by domain (tables, timing, shell)
 * - Performance-critical constants are marked with [PERF]
 * - Linux-compatible values are marked with [LINUX-COMPAT]
 */

use std::time::Duration;

// =============================================================================
// SHARED TABLE LIMITS
// =============================================================================

/// Maximum number of jobs a shell session can submit
/// Bounds the registry, each ready queue and the running set
pub const MAX_JOBS: usize = 128;

/// Number of feedback tiers (1 = highest, 4 = lowest)
pub const TIER_COUNT: usize = 4;

/// Inline capacity for a job name stored in shared memory (bytes)
/// Longer names are truncated on a UTF-8 boundary
pub const NAME_CAPACITY: usize = 256;

// =============================================================================
// TIMING
// =============================================================================

/// Smallest accepted base time slice
pub const MIN_TIME_SLICE: Duration = Duration::from_millis(1);

/// Spins on the cross-process lock before yielding the CPU
/// [PERF] Critical sections are a handful of array writes, so spinning wins
pub const LOCK_SPIN_LIMIT: u32 = 128;

/// Yields on the cross-process lock before checking whether the owner died
pub const LOCK_OWNER_CHECK_INTERVAL: u32 = 64;

// =============================================================================
// PROCESS CREATION
// =============================================================================

/// Exit status of a parked job whose exec failed
/// [LINUX-COMPAT] Same convention as POSIX shells for "command not found"
pub const EXEC_FAILURE_STATUS: i32 = 127;

// =============================================================================
// SHELL
// =============================================================================

/// Maximum number of command history entries kept by the shell
pub const HISTORY_CAPACITY: usize = 512;

/// Prompt printed before each input line
pub const SHELL_PROMPT: &str = "tiered-sched$ ";

/*!
 * Scheduler Configuration
 * Startup parameters shared by the shell and the scheduler process
 */

use super::errors::KernelError;
use super::limits::{MAX_JOBS, MIN_TIME_SLICE};
use super::types::KernelResult;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Validated startup configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of jobs dispatched at the same time
    pub cpus: NonZeroU32,
    /// Base quantum (tier 1)
    pub time_slice: Duration,
}

impl SchedulerConfig {
    /// Validate raw command line values
    pub fn new(cpus: u32, time_slice_ms: u64) -> KernelResult<Self> {
        let cpus = NonZeroU32::new(cpus)
            .ok_or_else(|| KernelError::Configuration("NCPU must be at least 1".into()))?;
        let time_slice = Duration::from_millis(time_slice_ms);
        if time_slice < MIN_TIME_SLICE {
            return Err(KernelError::Configuration(format!(
                "TSLICE must be at least {}ms",
                MIN_TIME_SLICE.as_millis()
            )));
        }

        Ok(Self { cpus, time_slice })
    }

    /// Processor count clamped to what the running set can hold
    #[inline]
    #[must_use]
    pub fn parallelism(&self) -> usize {
        (self.cpus.get() as usize).min(MAX_JOBS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = SchedulerConfig::new(2, 50).unwrap();
        assert_eq!(config.cpus.get(), 2);
        assert_eq!(config.time_slice, Duration::from_millis(50));
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(matches!(
            SchedulerConfig::new(0, 50),
            Err(KernelError::Configuration(_))
        ));
        assert!(matches!(
            SchedulerConfig::new(1, 0),
            Err(KernelError::Configuration(_))
        ));
    }

    #[test]
    fn test_parallelism_is_clamped() {
        let config = SchedulerConfig::new(10_000, 10).unwrap();
        assert_eq!(config.parallelism(), MAX_JOBS);
    }
}

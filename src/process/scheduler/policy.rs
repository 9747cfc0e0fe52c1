/*!
 * Feedback Policy
 * Per-tier quanta, parallelism and demotion rules
 */

use crate::core::config::SchedulerConfig;
use crate::core::types::Tier;
use std::time::Duration;

/// Multilevel feedback policy
///
/// Tier *n* gets `2^(n-1)` timer ticks of `base` each: lower tiers run
/// longer once dispatched.
/// There is no aging; a job demoted to tier 4 stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackPolicy {
    base_quantum: Duration,
    parallelism: usize,
}

impl FeedbackPolicy {
    pub fn new(base_quantum: Duration, parallelism: usize) -> Self {
        Self {
            base_quantum,
            parallelism: parallelism.max(1),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.time_slice, config.parallelism())
    }

    /// Quantum granted to a job dispatched at `tier`
    #[inline]
    #[must_use]
    pub fn quantum(&self, tier: Tier) -> Duration {
        self.base_quantum * (1u32 << tier.index())
    }

    /// Quantum of `tier` in timer ticks
    #[inline]
    #[must_use]
    pub const fn quantum_ticks(&self, tier: Tier) -> u32 {
        1 << tier.index()
    }

    /// Whether a job dispatched at `tier` has used up its quantum
    ///
    /// Counted in ticks rather than measured time: ticks are handled with
    /// some latency, and a job dispatched on a late tick must still yield
    /// on the following one.
    #[inline]
    #[must_use]
    pub const fn is_expired(&self, tier: Tier, ticks: u32) -> bool {
        ticks >= self.quantum_ticks(tier)
    }

    /// Tier a preempted job is re-queued at
    #[inline]
    #[must_use]
    pub fn demote(&self, tier: Tier) -> Tier {
        tier.demoted()
    }

    /// Timer period driving quantum checks
    pub fn tick(&self) -> Duration {
        self.base_quantum
    }

    /// Maximum number of simultaneously dispatched jobs
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}

/*!
 * Core Types
 * Common types used across the scheduler and the shell
 */

use super::limits::TIER_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OS process identifier
pub type Pid = i32;

/// Index of a record inside the shared registry (equals submission order)
pub type Slot = u32;

/// Monotonic timestamp in nanoseconds (CLOCK_MONOTONIC, system wide)
pub type Nanos = u64;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Feedback tier (1 = highest priority, 4 = lowest)
///
/// Stored as a single byte so it can live inside shared records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const HIGHEST: Tier = Tier(1);
    pub const LOWEST: Tier = Tier(TIER_COUNT as u8);

    /// Build a tier from its 1-based level
    #[inline]
    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level >= 1 && level <= TIER_COUNT as u8 {
            Some(Tier(level))
        } else {
            None
        }
    }

    /// Build a tier from a 0-based queue index
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < TIER_COUNT {
            Some(Tier(index as u8 + 1))
        } else {
            None
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// 0-based queue index
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// One tier lower, floored at the lowest tier
    #[inline]
    #[must_use]
    pub const fn demoted(self) -> Self {
        if self.0 < TIER_COUNT as u8 {
            Tier(self.0 + 1)
        } else {
            self
        }
    }

    /// All tiers, highest first
    pub fn all() -> impl Iterator<Item = Tier> {
        (1..=TIER_COUNT as u8).map(Tier)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::HIGHEST
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Tier::new(level).ok_or_else(|| format!("tier must be 1..={}, got {}", TIER_COUNT, level))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bounds() {
        assert!(Tier::new(0).is_none());
        assert_eq!(Tier::new(1), Some(Tier::HIGHEST));
        assert_eq!(Tier::new(4), Some(Tier::LOWEST));
        assert!(Tier::new(5).is_none());
    }

    #[test]
    fn test_demotion_floors_at_lowest() {
        let mut tier = Tier::HIGHEST;
        let mut seen = vec![tier.level()];
        for _ in 0..6 {
            tier = tier.demoted();
            seen.push(tier.level());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 4, 4, 4]);
    }

    #[test]
    fn test_index_round_trip() {
        for tier in Tier::all() {
            assert_eq!(Tier::from_index(tier.index()), Some(tier));
        }
        assert!(Tier::from_index(TIER_COUNT).is_none());
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Tier>("3").is_ok());
        assert!(serde_json::from_str::<Tier>("9").is_err());
    }
}

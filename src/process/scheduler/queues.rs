/*!
 * Priority Ready Queues
 * Four bounded ring buffers of registry slots, one per feedback tier
 */

use crate::core::errors::SchedulerError;
use crate::core::limits::{MAX_JOBS, TIER_COUNT};
use crate::core::types::{Slot, Tier};

/// Bounded FIFO of registry slots
///
/// O(1) push/pop at the ends. Interior removal shifts the entries behind the
/// removed one so the queue stays contiguous.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct RingQueue {
    slots: [Slot; MAX_JOBS],
    head: u32,
    len: u32,
}

impl RingQueue {
    pub const fn new() -> Self {
        Self {
            slots: [0; MAX_JOBS],
            head: 0,
            len: 0,
        }
    }

    #[inline(always)]
    fn physical(&self, logical: usize) -> usize {
        (self.head as usize + logical) % MAX_JOBS
    }

    /// Append at the tail; false when full
    pub fn push_back(&mut self, slot: Slot) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = self.physical(self.len as usize);
        self.slots[tail] = slot;
        self.len += 1;
        true
    }

    /// Pop the head
    pub fn pop_front(&mut self) -> Option<Slot> {
        if self.is_empty() {
            return None;
        }
        let slot = self.slots[self.head as usize];
        self.head = ((self.head as usize + 1) % MAX_JOBS) as u32;
        self.len -= 1;
        Some(slot)
    }

    pub fn front(&self) -> Option<Slot> {
        (!self.is_empty()).then(|| self.slots[self.head as usize])
    }

    /// Excise `slot`, shifting later entries forward; false when absent
    pub fn remove(&mut self, slot: Slot) -> bool {
        let Some(position) = self.position(slot) else {
            return false;
        };

        for logical in position..self.len as usize - 1 {
            let next = self.slots[self.physical(logical + 1)];
            let here = self.physical(logical);
            self.slots[here] = next;
        }
        self.len -= 1;
        true
    }

    pub fn position(&self, slot: Slot) -> Option<usize> {
        self.iter().position(|queued| queued == slot)
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.position(slot).is_some()
    }

    /// Entries from head to tail
    pub fn iter(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.len as usize).map(move |logical| self.slots[self.physical(logical)])
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len as usize >= MAX_JOBS
    }
}

impl Default for RingQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The four tier queues
///
/// Dequeue scans tier 1 to 4 and pops the head of the first non-empty tier:
/// that scan order is the priority policy. Within a tier order is strictly
/// arrival order.
#[repr(C)]
pub struct ReadyQueues {
    tiers: [RingQueue; TIER_COUNT],
}

impl ReadyQueues {
    pub const fn new() -> Self {
        Self {
            tiers: [RingQueue::new(); TIER_COUNT],
        }
    }

    /// Append `slot` at the tail of `tier`
    pub fn enqueue(&mut self, tier: Tier, slot: Slot) -> Result<(), SchedulerError> {
        if self.tiers[tier.index()].push_back(slot) {
            Ok(())
        } else {
            Err(SchedulerError::QueueFull {
                tier: tier.level(),
                capacity: MAX_JOBS,
            })
        }
    }

    /// Pop the head of the highest non-empty tier
    pub fn dequeue_highest_nonempty(&mut self) -> Option<(Tier, Slot)> {
        Tier::all().find_map(|tier| {
            self.tiers[tier.index()]
                .pop_front()
                .map(|slot| (tier, slot))
        })
    }

    /// Head of the highest non-empty tier, without removing it
    pub fn peek_highest(&self) -> Option<(Tier, Slot)> {
        Tier::all().find_map(|tier| self.tiers[tier.index()].front().map(|slot| (tier, slot)))
    }

    /// Remove `slot` from `tier`
    pub fn remove(&mut self, tier: Tier, slot: Slot) -> bool {
        self.tiers[tier.index()].remove(slot)
    }

    /// Remove `slot` from whichever tier holds it
    pub fn remove_anywhere(&mut self, slot: Slot) -> Option<Tier> {
        let tier = self.tier_of(slot)?;
        self.remove(tier, slot);
        Some(tier)
    }

    pub fn tier_of(&self, slot: Slot) -> Option<Tier> {
        Tier::all().find(|tier| self.tiers[tier.index()].contains(slot))
    }

    pub fn is_full(&self, tier: Tier) -> bool {
        self.tiers[tier.index()].is_full()
    }

    pub fn queue(&self, tier: Tier) -> &RingQueue {
        &self.tiers[tier.index()]
    }

    pub fn len(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].len()
    }

    pub fn total_len(&self) -> usize {
        self.tiers.iter().map(RingQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(RingQueue::is_empty)
    }
}

impl Default for ReadyQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(level: u8) -> Tier {
        Tier::new(level).unwrap()
    }

    #[test]
    fn test_fifo_within_tier() {
        let mut queues = ReadyQueues::new();
        for slot in 0..5 {
            queues.enqueue(tier(2), slot).unwrap();
        }
        let order: Vec<Slot> = std::iter::from_fn(|| queues.dequeue_highest_nonempty())
            .map(|(_, slot)| slot)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_highest_tier_first() {
        let mut queues = ReadyQueues::new();
        queues.enqueue(tier(3), 0).unwrap();
        queues.enqueue(tier(4), 1).unwrap();
        queues.enqueue(tier(1), 2).unwrap();

        assert_eq!(queues.peek_highest(), Some((tier(1), 2)));
        assert_eq!(queues.dequeue_highest_nonempty(), Some((tier(1), 2)));
        assert_eq!(queues.dequeue_highest_nonempty(), Some((tier(3), 0)));
        assert_eq!(queues.dequeue_highest_nonempty(), Some((tier(4), 1)));
        assert_eq!(queues.dequeue_highest_nonempty(), None);
    }

    #[test]
    fn test_interior_removal_keeps_order() {
        let mut queues = ReadyQueues::new();
        for slot in 10..15 {
            queues.enqueue(tier(1), slot).unwrap();
        }
        assert!(queues.remove(tier(1), 12));
        assert!(!queues.remove(tier(1), 12));
        let remaining: Vec<Slot> = queues.queue(tier(1)).iter().collect();
        assert_eq!(remaining, vec![10, 11, 13, 14]);
    }

    #[test]
    fn test_removal_across_wrap_around() {
        let mut queue = RingQueue::new();
        for slot in 0..MAX_JOBS as Slot {
            assert!(queue.push_back(slot));
        }
        assert!(!queue.push_back(999));

        // Advance head so the live range wraps past the end of the array
        for _ in 0..MAX_JOBS - 3 {
            queue.pop_front();
        }
        queue.push_back(500);
        queue.push_back(501);

        assert!(queue.remove(MAX_JOBS as Slot - 1));
        let remaining: Vec<Slot> = queue.iter().collect();
        assert_eq!(remaining, vec![MAX_JOBS as Slot - 3, MAX_JOBS as Slot - 2, 500, 501]);
    }

    #[test]
    fn test_full_tier_reports_exhaustion() {
        let mut queues = ReadyQueues::new();
        for slot in 0..MAX_JOBS as Slot {
            queues.enqueue(tier(4), slot).unwrap();
        }
        assert_eq!(
            queues.enqueue(tier(4), 0),
            Err(SchedulerError::QueueFull {
                tier: 4,
                capacity: MAX_JOBS
            })
        );
        assert!(queues.enqueue(tier(1), 0).is_ok());
    }

    #[test]
    fn test_remove_anywhere_reports_tier() {
        let mut queues = ReadyQueues::new();
        queues.enqueue(tier(3), 7).unwrap();
        assert_eq!(queues.remove_anywhere(7), Some(tier(3)));
        assert_eq!(queues.remove_anywhere(7), None);
        assert!(queues.is_empty());
    }

    #[test]
    fn test_empty_dequeue_is_none() {
        let mut queues = ReadyQueues::new();
        assert_eq!(queues.dequeue_highest_nonempty(), None);
        assert_eq!(queues.total_len(), 0);
    }
}

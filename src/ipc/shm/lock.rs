/*!
 * Cross-Process Mutex
 *
 * Spin lock whose state word lives inside a shared mapping, so the shell and
 * the scheduler process exclude each other. Never taken from signal
 * handlers: handlers only set flags.
 *
 * The state word holds the owner's OS pid. A waiter that has yielded for a
 * while checks whether the owner still exists and takes the lock over if it
 * died while holding it.
 */

use super::region::ShmSafe;
use crate::core::limits::{LOCK_OWNER_CHECK_INTERVAL, LOCK_SPIN_LIMIT};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid as NixPid;
use std::cell::UnsafeCell;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::thread;
use tracing::warn;

const UNLOCKED: i32 = 0;

/// Mutual exclusion usable across `fork()`
#[repr(C)]
pub struct ShmMutex<T> {
    owner: AtomicI32,
    contended: AtomicU64,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialised by `owner`
unsafe impl<T: Send> Sync for ShmMutex<T> {}
unsafe impl<T: Send> Send for ShmMutex<T> {}
unsafe impl<T: Send> ShmSafe for ShmMutex<T> {}

impl<T> ShmMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            owner: AtomicI32::new(UNLOCKED),
            contended: AtomicU64::new(0),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquire the lock, spinning then yielding while another holder exists
    pub fn lock(&self) -> ShmMutexGuard<'_, T> {
        let me = std::process::id() as i32;
        if self.try_acquire(me) {
            return ShmMutexGuard { mutex: self };
        }

        self.contended.fetch_add(1, Ordering::Relaxed);
        let mut spins: u32 = 0;
        let mut yields: u32 = 0;
        loop {
            if self.owner.load(Ordering::Relaxed) == UNLOCKED && self.try_acquire(me) {
                return ShmMutexGuard { mutex: self };
            }

            spins = spins.wrapping_add(1);
            if spins % LOCK_SPIN_LIMIT != 0 {
                hint::spin_loop();
                continue;
            }

            thread::yield_now();
            yields = yields.wrapping_add(1);
            if yields % LOCK_OWNER_CHECK_INTERVAL == 0 && self.steal_from_dead_owner(me) {
                return ShmMutexGuard { mutex: self };
            }
        }
    }

    /// Acquire the lock only if it is free
    pub fn try_lock(&self) -> Option<ShmMutexGuard<'_, T>> {
        let me = std::process::id() as i32;
        self.try_acquire(me).then(|| ShmMutexGuard { mutex: self })
    }

    /// Number of acquisitions that had to wait
    pub fn contention(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }

    /// Exclusive access without locking (not yet shared)
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    #[inline]
    fn try_acquire(&self, me: i32) -> bool {
        self.owner
            .compare_exchange_weak(UNLOCKED, me, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn steal_from_dead_owner(&self, me: i32) -> bool {
        let owner = self.owner.load(Ordering::Relaxed);
        if owner == UNLOCKED || owner == me {
            return false;
        }
        if kill(NixPid::from_raw(owner), None) != Err(Errno::ESRCH) {
            return false;
        }
        let stolen = self
            .owner
            .compare_exchange(owner, me, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if stolen {
            warn!(dead_owner = owner, "Recovered shared lock from a process that exited while holding it");
        }
        stolen
    }
}

/// RAII guard; releases the lock on drop
pub struct ShmMutexGuard<'a, T> {
    mutex: &'a ShmMutex<T>,
}

impl<T> Deref for ShmMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership
        unsafe { &*self.mutex.value.get() }
    }
}

impl<T> DerefMut for ShmMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves exclusive ownership
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<T> Drop for ShmMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.owner.store(UNLOCKED, Ordering::Release);
    }
}

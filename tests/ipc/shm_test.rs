/*!
 * Shared Memory Tests
 * Region sharing and mutual exclusion across fork
 */

use nix::libc;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tiered_sched::ipc::{ShmMutex, ShmRegion, ShmSafe};

const ROUNDS: u64 = 2_000;

#[repr(C)]
struct Counters {
    total: ShmMutex<u64>,
}

unsafe impl ShmSafe for Counters {}

#[test]
#[serial]
fn test_child_writes_are_visible_to_parent() {
    let region = ShmRegion::new(Counters {
        total: ShmMutex::new(0),
    })
    .unwrap();

    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            *region.total.lock() = 42;
            unsafe { libc::_exit(0) };
        }
        ForkResult::Parent { child } => {
            assert_eq!(waitpid(child, None).unwrap(), WaitStatus::Exited(child, 0));
            assert_eq!(*region.total.lock(), 42);
        }
    }
}

#[test]
#[serial]
fn test_lock_excludes_other_process() {
    let region = ShmRegion::new(Counters {
        total: ShmMutex::new(0),
    })
    .unwrap();

    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            for _ in 0..ROUNDS {
                *region.total.lock() += 1;
            }
            unsafe { libc::_exit(0) };
        }
        ForkResult::Parent { child } => {
            for _ in 0..ROUNDS {
                *region.total.lock() += 1;
            }
            assert_eq!(waitpid(child, None).unwrap(), WaitStatus::Exited(child, 0));
            assert_eq!(*region.total.lock(), 2 * ROUNDS);
        }
    }
}

#[test]
#[serial]
fn test_lock_recovered_from_dead_holder() {
    let region = ShmRegion::new(Counters {
        total: ShmMutex::new(0),
    })
    .unwrap();

    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            let guard = region.total.lock();
            std::mem::forget(guard);
            unsafe { libc::_exit(0) };
        }
        ForkResult::Parent { child } => {
            waitpid(child, None).unwrap();
            assert!(region.total.try_lock().is_none());
            *region.total.lock() += 1;
            assert_eq!(*region.total.lock(), 1);
        }
    }
}

/*!
 * Shared Memory Region
 * Anonymous MAP_SHARED mapping that survives fork
 */

use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use nix::sys::mman::{mmap_anonymous, munmap, MapFlags, ProtFlags};
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Types that may be placed in a region shared between processes
///
/// # Safety
/// Implementors must be plain data: no pointers, references or heap-owning
/// fields, and every field must tolerate being mutated by another process
/// through interior mutability (atomics or [`super::ShmMutex`]). The value is
/// never dropped, so `Drop` impls are not run.
pub unsafe trait ShmSafe: Sync {}

/// A value of type `T` living in an anonymous shared mapping
///
/// Created before `fork()`: parent and child then address the same physical
/// pages. Only shared references are handed out; all mutation goes through
/// the interior mutability of `T`.
pub struct ShmRegion<T: ShmSafe> {
    ptr: NonNull<T>,
    len: NonZeroUsize,
}

// SAFETY: T is Sync (required by ShmSafe) and the mapping lives until drop
unsafe impl<T: ShmSafe> Send for ShmRegion<T> {}
unsafe impl<T: ShmSafe> Sync for ShmRegion<T> {}

impl<T: ShmSafe> ShmRegion<T> {
    /// Map a new shared region and move `value` into it
    pub fn new(value: T) -> KernelResult<Self> {
        let len = NonZeroUsize::new(std::mem::size_of::<T>())
            .ok_or_else(|| KernelError::SharedMemory("cannot map a zero-sized value".into()))?;

        // SAFETY: anonymous mapping with no fixed address, no file descriptor involved
        let raw = unsafe {
            mmap_anonymous(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
            )
        }
        .map_err(|e| KernelError::SharedMemory(format!("mmap of {} bytes failed: {}", len, e)))?;

        let ptr = raw.cast::<T>();
        // SAFETY: the mapping is page aligned, at least size_of::<T>() bytes and not yet shared
        unsafe { ptr.as_ptr().write(value) };

        debug!(bytes = len.get(), "Shared region mapped");
        Ok(Self { ptr, len })
    }

    /// Size of the mapping in bytes
    pub fn mapped_bytes(&self) -> usize {
        self.len.get()
    }
}

impl<T: ShmSafe> Deref for ShmRegion<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: initialised in new() and valid until munmap in drop
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ShmSafe> Drop for ShmRegion<T> {
    fn drop(&mut self) {
        // SAFETY: ptr/len come from the successful mmap in new()
        if let Err(e) = unsafe { munmap(self.ptr.cast(), self.len.get()) } {
            warn!(error = %e, "munmap of shared region failed");
        }
    }
}

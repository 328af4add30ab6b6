//! Fixed-length, zero-initialized scratch buffers.
//!
//! [`ScratchBuffer`] is the building block of a [`Workspace`](crate::Workspace):
//! one independently owned, 64-byte aligned allocation whose contents start
//! out as all-zero bytes.
//!
//! # Fallible Allocation
//!
//! Construction never aborts the process on out-of-memory. It reports
//! [`WorkspaceError::AllocationFailure`] instead, so the caller can decide
//! how to react:
//!
//! ```rust
//! use lga_workspace::ScratchBuffer;
//!
//! let mut buf = ScratchBuffer::<i64>::try_zeroed(1024).unwrap();
//! assert_eq!(buf.len(), 1024);
//! assert!(buf.as_slice().iter().all(|&v| v == 0));
//!
//! buf[3] = 42;
//! assert_eq!(buf.as_slice()[3], 42);
//! ```
//!
//! # Release
//!
//! The allocation is returned to its allocator on drop. A buffer that never
//! allocated (zero length) releases nothing, so dropping it is a no-op.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use bytemuck::Zeroable;

use crate::allocator::{Global, RawAllocator};
use crate::error::{WorkspaceError, WorkspaceResult};

/// Cache line size for buffer alignment (64 bytes).
pub const CACHE_LINE: usize = 64;

/// Zero-initialized buffer of `T` with a fixed length.
///
/// The element bound [`Zeroable`] guarantees that all-zero memory is a valid
/// `T`, which is what makes zeroed allocation sound.
///
/// # Safety
///
/// The buffer uses raw allocation through a [`RawAllocator`]. All unsafe
/// operations are encapsulated and the public API is safe.
pub struct ScratchBuffer<T: Zeroable, A: RawAllocator = Global> {
    ptr: NonNull<T>,
    len: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// Safety: ScratchBuffer owns its data and doesn't share it
unsafe impl<T: Zeroable + Send, A: RawAllocator + Send> Send for ScratchBuffer<T, A> {}
unsafe impl<T: Zeroable + Sync, A: RawAllocator + Sync> Sync for ScratchBuffer<T, A> {}

impl<T: Zeroable> ScratchBuffer<T, Global> {
    /// Allocates `len` zeroed elements from the system allocator.
    pub fn try_zeroed(len: usize) -> WorkspaceResult<Self> {
        Self::try_zeroed_in(len, Global)
    }
}

impl<T: Zeroable, A: RawAllocator> ScratchBuffer<T, A> {
    /// Creates an empty buffer that owns no allocation.
    pub fn empty_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Allocates `len` zeroed elements from `alloc`.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::Overflow`] if `len * size_of::<T>()` is not a valid layout.
    /// - [`WorkspaceError::AllocationFailure`] if the allocator is out of memory.
    pub fn try_zeroed_in(len: usize, alloc: A) -> WorkspaceResult<Self> {
        if len == 0 || std::mem::size_of::<T>() == 0 {
            let mut buf = Self::empty_in(alloc);
            buf.len = len;
            return Ok(buf);
        }

        let layout = Self::layout(len)?;
        let raw = alloc
            .allocate_zeroed(layout)
            .ok_or(WorkspaceError::AllocationFailure)?;

        Ok(Self {
            ptr: raw.cast::<T>(),
            len,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Capacity in elements. Always equal to [`len`](Self::len).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Is empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the owned allocation in bytes (0 if nothing was allocated).
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Returns a slice of the buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid (or dangling and aligned for len 0 / ZST) for `len` elements
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns a mutable slice of the buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: ptr uniquely owned, valid for `len` elements
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Resets every element to zero.
    #[inline]
    pub fn zero(&mut self) {
        if self.owns_allocation() {
            // SAFETY: buffer is allocated for `len` elements; zero bytes are a valid T
            unsafe {
                std::ptr::write_bytes(self.ptr.as_ptr(), 0, self.len);
            }
        }
    }

    /// Raw pointer (for FFI consumers).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Raw mutable pointer (for FFI consumers).
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    fn owns_allocation(&self) -> bool {
        self.len > 0 && std::mem::size_of::<T>() > 0
    }

    fn layout(len: usize) -> WorkspaceResult<Layout> {
        Layout::array::<T>(len)
            .and_then(|layout| layout.align_to(CACHE_LINE))
            .map_err(|_| {
                WorkspaceError::overflow(format!(
                    "{} elements of {} bytes is not a valid layout",
                    len,
                    std::mem::size_of::<T>()
                ))
            })
    }
}

impl<T: Zeroable, A: RawAllocator> Drop for ScratchBuffer<T, A> {
    fn drop(&mut self) {
        if !self.owns_allocation() {
            return;
        }
        // Layout was valid at construction, so recomputing it succeeds
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: ptr came from `self.alloc` with this layout and is released once
            unsafe {
                self.alloc.deallocate(self.ptr.cast::<u8>(), layout);
            }
        }
    }
}

impl<T: Zeroable, A: RawAllocator> std::ops::Index<usize> for ScratchBuffer<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T: Zeroable, A: RawAllocator> std::ops::IndexMut<usize> for ScratchBuffer<T, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Zeroable, A: RawAllocator> fmt::Debug for ScratchBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("element", &std::any::type_name::<T>())
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::TrackingAllocator;

    #[test]
    fn test_scratch_buffer_basic() {
        let mut buf = ScratchBuffer::<f32>::try_zeroed(100).unwrap();
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.capacity(), 100);
        assert_eq!(buf.size_bytes(), 400);
        assert!(buf.as_slice().iter().all(|&v| v == 0.0));

        // Check alignment
        assert_eq!(buf.as_ptr() as usize % CACHE_LINE, 0);

        buf[99] = 1.5;
        assert_eq!(buf[99], 1.5);
    }

    #[test]
    fn test_zero_resets_contents() {
        let mut buf = ScratchBuffer::<i64>::try_zeroed(16).unwrap();
        for (i, v) in buf.as_mut_slice().iter_mut().enumerate() {
            *v = i as i64 + 1;
        }
        buf.zero();
        assert!(buf.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_empty_buffer_owns_nothing() {
        let tracker = TrackingAllocator::new();
        let buf = ScratchBuffer::<i64, _>::try_zeroed_in(0, tracker.clone()).unwrap();
        assert!(buf.is_empty());
        assert!(buf.as_slice().is_empty());
        drop(buf);
        assert_eq!(tracker.attempts(), 0);
        assert_eq!(tracker.deallocations(), 0);

        // Dropping a never-allocated buffer is a no-op
        drop(ScratchBuffer::<f32, _>::empty_in(tracker.clone()));
        assert_eq!(tracker.deallocations(), 0);
    }

    #[test]
    fn test_drop_releases_once() {
        let tracker = TrackingAllocator::new();
        let buf = ScratchBuffer::<i64, _>::try_zeroed_in(300, tracker.clone()).unwrap();
        assert_eq!(tracker.live(), 1);
        assert_eq!(tracker.live_bytes(), 300 * 8);
        drop(buf);
        assert_eq!(tracker.deallocations(), 1);
        assert_eq!(tracker.live_bytes(), 0);
    }

    #[test]
    fn test_allocation_failure() {
        let tracker = TrackingAllocator::failing_at(0);
        let result = ScratchBuffer::<i64, _>::try_zeroed_in(10, tracker.clone());
        assert!(matches!(result, Err(WorkspaceError::AllocationFailure)));
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_layout_overflow() {
        let result = ScratchBuffer::<i64>::try_zeroed(usize::MAX / 2);
        assert!(matches!(result, Err(WorkspaceError::Overflow(_))));
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds() {
        let buf = ScratchBuffer::<i64>::try_zeroed(4).unwrap();
        let _ = buf[4];
    }
}

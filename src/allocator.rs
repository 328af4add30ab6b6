//! Allocation backends for workspace buffers.
//!
//! Every [`ScratchBuffer`](crate::ScratchBuffer) obtains its memory through a
//! [`RawAllocator`]. Production code uses [`Global`]; [`TrackingAllocator`]
//! wraps it with counters and fault injection so leak-freedom and
//! failure atomicity can be checked from tests.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of zero-initialized memory for workspace buffers.
///
/// # Safety
///
/// Implementors must return memory that is valid for `layout`, entirely
/// zeroed, and not aliased by any other live allocation. `deallocate` must
/// accept every pointer previously returned by `allocate_zeroed` on the same
/// allocator (or a clone of it) with the same layout.
pub unsafe trait RawAllocator: Clone {
    /// Allocates zeroed memory for `layout`, or `None` when out of memory.
    ///
    /// Callers never pass a zero-sized layout.
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Releases memory returned by [`allocate_zeroed`](Self::allocate_zeroed).
    ///
    /// # Safety
    ///
    /// `ptr` must come from this allocator with exactly `layout`, and must not
    /// be released twice.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The process-wide system allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

// SAFETY: delegates to std::alloc, which upholds the contract for non-zero layouts
unsafe impl RawAllocator for Global {
    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        // SAFETY: layout has non-zero size (caller contract)
        NonNull::new(unsafe { alloc_zeroed(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        dealloc(ptr.as_ptr(), layout);
    }
}

#[derive(Debug, Default)]
struct TrackingState {
    attempts: AtomicUsize,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live: AtomicUsize,
    live_bytes: AtomicUsize,
    /// Zero-based attempt index to fail; `usize::MAX` disables injection.
    fail_at: AtomicUsize,
}

/// Counting allocator with optional fault injection.
///
/// Clones share counters, so a workspace built with a clone is visible
/// through the original handle.
///
/// ```rust
/// use lga_workspace::{TrackingAllocator, Workspace, WorkspaceConfig};
///
/// let tracker = TrackingAllocator::failing_at(3);
/// let result = Workspace::new_in(&WorkspaceConfig::new(10), tracker.clone());
/// assert!(result.is_err());
/// assert_eq!(tracker.live(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct TrackingAllocator {
    state: Arc<TrackingState>,
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingAllocator {
    /// Creates a tracker that never fails.
    pub fn new() -> Self {
        let state = TrackingState {
            fail_at: AtomicUsize::new(usize::MAX),
            ..Default::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates a tracker whose `nth` allocation attempt (zero-based) fails.
    pub fn failing_at(nth: usize) -> Self {
        let tracker = Self::new();
        tracker.fail_at(nth);
        tracker
    }

    /// Arms failure injection at attempt `nth`, counted from creation.
    pub fn fail_at(&self, nth: usize) {
        self.state.fail_at.store(nth, Ordering::SeqCst);
    }

    /// Disables failure injection.
    pub fn disarm(&self) {
        self.state.fail_at.store(usize::MAX, Ordering::SeqCst);
    }

    /// Allocation attempts, including injected failures.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Successful allocations.
    pub fn allocations(&self) -> usize {
        self.state.allocations.load(Ordering::SeqCst)
    }

    /// Deallocations.
    pub fn deallocations(&self) -> usize {
        self.state.deallocations.load(Ordering::SeqCst)
    }

    /// Allocations not yet released.
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Bytes not yet released.
    pub fn live_bytes(&self) -> usize {
        self.state.live_bytes.load(Ordering::SeqCst)
    }
}

// SAFETY: successful allocations come straight from Global
unsafe impl RawAllocator for TrackingAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == self.state.fail_at.load(Ordering::SeqCst) {
            return None;
        }

        let ptr = Global.allocate_zeroed(layout)?;
        self.state.allocations.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        self.state
            .live_bytes
            .fetch_add(layout.size(), Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        Global.deallocate(ptr, layout);
        self.state.live.fetch_sub(1, Ordering::SeqCst);
        self.state.deallocations.fetch_add(1, Ordering::SeqCst);
        self.state
            .live_bytes
            .fetch_sub(layout.size(), Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_zeroed() {
        let layout = Layout::from_size_align(128, 64).unwrap();
        let ptr = Global.allocate_zeroed(layout).unwrap();
        // SAFETY: 128 bytes were just allocated
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 128) };
        assert!(bytes.iter().all(|&b| b == 0));
        // SAFETY: same layout, released once
        unsafe { Global.deallocate(ptr, layout) };
    }

    #[test]
    fn test_tracking_counts() {
        let tracker = TrackingAllocator::new();
        let layout = Layout::from_size_align(64, 8).unwrap();

        let a = tracker.allocate_zeroed(layout).unwrap();
        let b = tracker.clone().allocate_zeroed(layout).unwrap();
        assert_eq!(tracker.allocations(), 2);
        assert_eq!(tracker.live_bytes(), 128);

        // SAFETY: both pointers came from this tracker with `layout`
        unsafe {
            tracker.deallocate(a, layout);
            tracker.deallocate(b, layout);
        }
        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.live_bytes(), 0);
        assert_eq!(tracker.deallocations(), 2);
    }

    #[test]
    fn test_fault_injection() {
        let tracker = TrackingAllocator::failing_at(1);
        let layout = Layout::from_size_align(16, 8).unwrap();

        let first = tracker.allocate_zeroed(layout);
        assert!(first.is_some());
        assert!(tracker.allocate_zeroed(layout).is_none());
        assert_eq!(tracker.attempts(), 2);
        assert_eq!(tracker.allocations(), 1);

        // Only the armed attempt fails
        let third = tracker.allocate_zeroed(layout).unwrap();

        // SAFETY: both came from this tracker
        unsafe {
            tracker.deallocate(first.unwrap(), layout);
            tracker.deallocate(third, layout);
        }
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_live_readable_during_concurrent_churn() {
        use std::sync::atomic::AtomicBool;
        use std::thread;

        let tracker = TrackingAllocator::new();
        let done = Arc::new(AtomicBool::new(false));
        let layout = Layout::from_size_align(32, 8).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..20_000 {
                        let ptr = tracker.allocate_zeroed(layout).unwrap();
                        // SAFETY: allocated above with `layout`
                        unsafe { tracker.deallocate(ptr, layout) };
                    }
                })
            })
            .collect();

        let reader = {
            let tracker = tracker.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    // At most one buffer per worker is outstanding
                    assert!(tracker.live() <= 4, "live={}", tracker.live());
                }
            })
        };

        for worker in workers {
            worker.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        reader.join().unwrap();

        assert_eq!(tracker.live(), 0);
        assert_eq!(tracker.allocations(), 80_000);
        assert_eq!(tracker.deallocations(), 80_000);
    }

    #[test]
    fn test_disarm() {
        let tracker = TrackingAllocator::failing_at(0);
        tracker.disarm();
        let layout = Layout::from_size_align(8, 8).unwrap();
        let ptr = tracker.allocate_zeroed(layout).unwrap();
        // SAFETY: allocated above
        unsafe { tracker.deallocate(ptr, layout) };
    }
}

use crate::wrapper::Wrapper;
use concur_core::Backoff;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// `head` is a single `AtomicPtr<Wrapper<T>>` pointing at the top of the
// stack, or null when empty.
//
// - `acquire`: Acquire-load `head`, read the candidate node's `next` (safe:
//   the node is still linked, no one else writes `next` for a linked node
//   until it is popped), then release the node via a CAS that moves `head`
//   to `next`. The winning CAS is Acquire so the caller observes everything
//   the releasing thread wrote to the payload before it was pushed.
// - `release`: the releasing thread owns the `Box` outright, so writing its
//   `next` field is unsynchronized by construction (no other thread can see
//   this pointer until the CAS below publishes it). The publishing CAS is
//   Release.
//
// No ABA hazard arises under the documented contract: a wrapper currently
// linked into the pool is never handed to `release` a second time without an
// intervening `acquire`, because `release` takes the `Box<Wrapper<T>>` by
// value. The type system prevents a caller from releasing the same
// allocation twice from safe code.
//
// =============================================================================

/// Unbounded lock-free MPMC LIFO object pool (Treiber stack).
///
/// All coordination lives in a single `AtomicPtr<Wrapper<T>>`; every mutation
/// is one CAS on that pointer. The pool does not manage payload lifetimes
/// beyond the wrappers it currently holds. A caller that permanently
/// removes a wrapper from circulation is responsible for dropping it.
pub struct Pool<T> {
    head: AtomicPtr<Wrapper<T>>,
}

// SAFETY: Pool<T> only moves Wrapper<T> ownership between threads via CAS on
// `head`; this is safe whenever T itself is Send.
unsafe impl<T: Send> Send for Pool<T> {}
unsafe impl<T: Send> Sync for Pool<T> {}

impl<T> Pool<T> {
    /// Creates a new, empty pool.
    pub const fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Returns true if the pool currently holds no wrappers.
    ///
    /// This is a snapshot; under concurrent access it may be stale the
    /// instant it returns.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Relaxed).is_null()
    }

    /// Acquires the top wrapper, or `None` if the pool is empty.
    ///
    /// No retry is performed on an empty pool: "empty" is a normal outcome,
    /// not a transient condition to spin past.
    pub fn acquire(&self) -> Option<Box<Wrapper<T>>> {
        loop {
            let h = self.head.load(Ordering::Acquire);
            if h.is_null() {
                return None;
            }
            // SAFETY: `h` was just loaded from `head` and is non-null, so it
            // points at a wrapper still linked into this pool. Only the
            // thread that wins the CAS below detaches it; until then no one
            // mutates its `next` field, so this read is race-free.
            let next = unsafe { *(*h).next.get() };
            if self
                .head
                .compare_exchange_weak(h, next, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                // SAFETY: we just won the CAS that unlinked `h` from the
                // pool. No other thread holds a reference to it anymore, so
                // reclaiming it as an owned Box is sound.
                return Some(unsafe { Box::from_raw(h) });
            }
        }
    }

    /// Acquires the top wrapper, backing off under contention instead of
    /// spinning tightly. Still returns `None` immediately once the pool is
    /// observed empty.
    pub fn acquire_with_backoff(&self) -> Option<Box<Wrapper<T>>> {
        let mut backoff = Backoff::new();
        loop {
            let h = self.head.load(Ordering::Acquire);
            if h.is_null() {
                return None;
            }
            let next = unsafe { *(*h).next.get() };
            if self
                .head
                .compare_exchange_weak(h, next, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Some(unsafe { Box::from_raw(h) });
            }
            backoff.spin();
        }
    }

    /// Releases a single wrapper back onto the pool.
    ///
    /// The caller must have exclusive ownership of `wrapper` (it came from
    /// `acquire` or was constructed fresh). `Box` ownership semantics make
    /// this a compile-time guarantee rather than just a documented contract.
    pub fn release(&self, wrapper: Box<Wrapper<T>>) {
        let ptr = Box::into_raw(wrapper);
        loop {
            let h = self.head.load(Ordering::Relaxed);
            // SAFETY: `ptr` is not yet visible to any other thread (it is
            // still only reachable from this stack frame), so writing its
            // `next` field is unsynchronized by construction.
            unsafe {
                *(*ptr).next.get() = h;
            }
            if self
                .head
                .compare_exchange_weak(h, ptr, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Releases a contiguous batch of wrappers with a single CAS.
    ///
    /// Semantically equivalent to calling [`release`](Self::release) once
    /// per item, but links the whole batch into a chain first and swings
    /// `head` only once. The chain's **last** element's `next` is set to the
    /// prior head. Linking the first element there instead would detach
    /// every item but the first from the pool's existing contents.
    pub fn release_batch(&self, items: Vec<Box<Wrapper<T>>>) {
        if items.is_empty() {
            return;
        }

        let ptrs: Vec<*mut Wrapper<T>> = items.into_iter().map(Box::into_raw).collect();
        let n = ptrs.len();

        for i in 0..n - 1 {
            // SAFETY: each `ptrs[i]` is freshly boxed and not yet visible to
            // any other thread.
            unsafe {
                *(*ptrs[i]).next.get() = ptrs[i + 1];
            }
        }

        let first = ptrs[0];
        let last = ptrs[n - 1];

        loop {
            let h = self.head.load(Ordering::Relaxed);
            // SAFETY: `last` is still private to this call until the CAS
            // below succeeds.
            unsafe {
                *(*last).next.get() = h;
            }
            if self
                .head
                .compare_exchange_weak(h, first, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        let mut node = *self.head.get_mut();
        while !node.is_null() {
            // SAFETY: on drop, no other thread can be concurrently
            // acquiring/releasing (we have `&mut self`), so the chain is
            // ours to walk and free exclusively.
            let boxed = unsafe { Box::from_raw(node) };
            node = unsafe { *boxed.next.get() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_then_acquire_round_trip() {
        let pool = Pool::new();
        pool.release(Box::new(Wrapper::new(42)));

        let w = pool.acquire().unwrap();
        assert_eq!(*w.payload(), 42);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_lifo_order() {
        let pool = Pool::new();
        pool.release(Box::new(Wrapper::new(1)));
        pool.release(Box::new(Wrapper::new(2)));
        pool.release(Box::new(Wrapper::new(3)));

        assert_eq!(*pool.acquire().unwrap().payload(), 3);
        assert_eq!(*pool.acquire().unwrap().payload(), 2);
        assert_eq!(*pool.acquire().unwrap().payload(), 1);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_acquire_empty_returns_none() {
        let pool: Pool<u64> = Pool::new();
        assert!(pool.acquire().is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_batch_preserves_lifo_and_links_last_to_old_head() {
        let pool = Pool::new();
        pool.release(Box::new(Wrapper::new(0))); // pre-existing content

        let batch = vec![
            Box::new(Wrapper::new(1)),
            Box::new(Wrapper::new(2)),
            Box::new(Wrapper::new(3)),
        ];
        pool.release_batch(batch);

        // The batch's first element becomes the new head; walking down
        // drains the whole batch (in push order) before reaching the
        // pre-existing item, proving the *last* batch element's `next` was
        // linked to the old head, not the first's.
        assert_eq!(*pool.acquire().unwrap().payload(), 1);
        assert_eq!(*pool.acquire().unwrap().payload(), 2);
        assert_eq!(*pool.acquire().unwrap().payload(), 3);
        assert_eq!(*pool.acquire().unwrap().payload(), 0);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_release_batch_empty_is_noop() {
        let pool: Pool<u64> = Pool::new();
        pool.release_batch(Vec::new());
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_multiset_conservation() {
        let pool = Pool::new();
        for i in 0..100 {
            pool.release(Box::new(Wrapper::new(i)));
        }

        let mut seen = Vec::new();
        while let Some(w) = pool.acquire() {
            seen.push(w.into_inner());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
}

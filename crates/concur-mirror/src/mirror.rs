use crate::image::MirrorFrom;
use concur_core::PrimitiveError;
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// SEQLOCK MEMORY ORDERING
// =============================================================================
//
// `before`/`after` are a classic one-writer seqlock:
//
// Writer (`write`):
//   1. fetch_add `before` (Release), publishing "a write has started";
//      the old value `b` is used to validate the closing CAS.
//   2. copy `from` into `initial` (ordinary, unsynchronized, protected by
//      the surrounding counter protocol, not by its own ordering).
//   3. CAS `after` from `b` to `b + 1` (Release), publishing the completed
//      copy. Must succeed under the single-writer contract; failure means a
//      second writer raced this one.
//
// Reader (`read`):
//   1. Acquire-load `after` as `rev`.
//   2. copy `initial` into `into`.
//   3. Acquire-load `before`; if it equals `rev`, the copy observed in step
//      2 is consistent with the write that published `rev` (or the initial
//      value, if rev == 0 and no write has occurred). Otherwise a write
//      overlapped the copy, so retry.
//
// =============================================================================

/// Single-writer / many-reader snapshot of a user-defined [`MirrorFrom`]
/// image.
///
/// All coordination lives in two `AtomicU64` counters (`before`/`after`); the
/// canonical storage is a single `initial` image, double-buffered only in
/// the sense that a reader's own `into` image acts as its second buffer.
pub struct Mirror<T> {
    initial: UnsafeCell<T>,
    before: AtomicU64,
    after: AtomicU64,
}

// SAFETY: all access to `initial` is mediated by the before/after seqlock
// protocol documented above; this is sound whenever T itself is Send.
unsafe impl<T: Send> Send for Mirror<T> {}
unsafe impl<T: Send> Sync for Mirror<T> {}

impl<T: MirrorFrom> Mirror<T> {
    /// Creates a new mirror whose canonical storage starts as `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            initial: UnsafeCell::new(initial),
            before: AtomicU64::new(0),
            after: AtomicU64::new(0),
        }
    }

    /// Publishes `from`'s contents as the mirror's new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::SelfMirror`] if `from` is this mirror's own
    /// `initial` image (a programmer error: there is nothing to copy from).
    ///
    /// Returns [`PrimitiveError::ConcurrentWriterDetected`] if the closing
    /// CAS on `after` fails, meaning a second writer raced this call. This
    /// is a violation of the single-writer contract, not a retryable
    /// condition: the caller has a concurrency bug.
    pub fn write(&self, from: &T) -> Result<(), PrimitiveError> {
        // SAFETY: reading the raw pointer (not its pointee) to compare
        // identity never touches the UnsafeCell's contents.
        if ptr::eq(from, unsafe { &*self.initial.get() } as *const T) {
            return Err(PrimitiveError::SelfMirror);
        }

        let b = self.before.fetch_add(1, Ordering::Release);
        concur_core::debug_assert_seqlock_parity!(b + 1, self.after.load(Ordering::Relaxed));

        // SAFETY: the single-writer contract guarantees no other thread is
        // concurrently mutating `initial`; readers only ever read it and
        // revalidate via `before`/`after`, so this mutable access races only
        // against reads, which the protocol accounts for.
        unsafe {
            (*self.initial.get()).mirror_from(from);
        }

        let published = self
            .after
            .compare_exchange(b, b + 1, Ordering::Release, Ordering::Relaxed)
            .is_ok();

        concur_core::debug_assert_single_writer!(published);

        if !published {
            return Err(PrimitiveError::ConcurrentWriterDetected);
        }
        Ok(())
    }

    /// Copies the mirror's current snapshot into `into`.
    ///
    /// Always wait-free in at most two iterations under the single-writer
    /// contract: a concurrent write can only invalidate the in-progress copy
    /// once before `after` catches up.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::SelfMirror`] if `into` is this mirror's own
    /// `initial` image.
    pub fn read(&self, into: &mut T) -> Result<(), PrimitiveError> {
        if ptr::eq(into as *const T, unsafe { &*self.initial.get() } as *const T) {
            return Err(PrimitiveError::SelfMirror);
        }

        loop {
            let rev = self.after.load(Ordering::Acquire);
            // SAFETY: a torn read of `initial` mid-write is possible here;
            // that is exactly what the before/after revalidation below is
            // for. The copy itself never produces undefined behavior (it
            // only risks observing a half-updated value), and the caller
            // never sees such a value because we loop on mismatch.
            unsafe {
                into.mirror_from(&*self.initial.get());
            }
            if self.before.load(Ordering::Acquire) == rev {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;

    #[test]
    fn test_write_then_read_round_trip() {
        let mirror = Mirror::new(Image(0i64));
        mirror.write(&Image(42)).unwrap();

        let mut into = Image(0i64);
        mirror.read(&mut into).unwrap();
        assert_eq!(into.0, 42);
    }

    #[test]
    fn test_sequential_writes_never_observed_as_a_mixture() {
        let mirror = Mirror::new(Image(0i64));

        mirror.write(&Image(42)).unwrap();
        let mut into = Image(-1i64);
        mirror.read(&mut into).unwrap();
        assert_eq!(into.0, 42);

        mirror.write(&Image(99)).unwrap();
        mirror.read(&mut into).unwrap();
        assert_eq!(into.0, 99);
    }

    #[test]
    fn test_read_before_any_write_yields_initial() {
        let mirror = Mirror::new(Image(7i64));
        let mut into = Image(0i64);
        mirror.read(&mut into).unwrap();
        assert_eq!(into.0, 7);
    }

    #[test]
    fn test_write_with_initial_as_source_is_rejected() {
        let mirror = Mirror::new(Image(0i64));
        // `tests` is a submodule of `mirror`, so it may reach the private
        // `initial` field directly to fabricate the one alias that must be
        // rejected.
        let initial_alias = unsafe { &*mirror.initial.get() };
        assert_eq!(mirror.write(initial_alias), Err(PrimitiveError::SelfMirror));
    }

    #[test]
    fn test_read_with_initial_as_destination_is_rejected() {
        let mirror = Mirror::new(Image(0i64));
        let initial_alias = unsafe { &mut *mirror.initial.get() };
        assert_eq!(mirror.read(initial_alias), Err(PrimitiveError::SelfMirror));
    }
}

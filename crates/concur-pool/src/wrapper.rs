use std::cell::UnsafeCell;

/// An owned node holding a user payload and the pool's intrusive "next" link.
///
/// A `Wrapper` is owned either by the pool (linked into its stack) or by the
/// caller that `acquire`d it (detached), never both at once. The `next`
/// pointer is crate-internal: callers must not inspect or rely on its value
/// while holding a detached wrapper.
pub struct Wrapper<T> {
    payload: T,
    pub(crate) next: UnsafeCell<*mut Wrapper<T>>,
}

// SAFETY: `next` is only ever read/written by the single thread that
// currently holds exclusive ownership of this node: either the pool thread
// that just won the linking CAS, or the caller that holds the detached Box.
unsafe impl<T: Send> Send for Wrapper<T> {}
unsafe impl<T: Sync> Sync for Wrapper<T> {}

impl<T> Wrapper<T> {
    /// Creates a new, detached wrapper around `payload`.
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            next: UnsafeCell::new(std::ptr::null_mut()),
        }
    }

    /// Borrows the payload.
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Mutably borrows the payload.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Consumes the wrapper, returning the payload.
    #[inline]
    pub fn into_inner(self) -> T {
        self.payload
    }
}

use crate::config::BufferConfig;
use crate::cursor::{decode, encode, layout, MAX_SIZE_POW2};
use crate::listener::{WaitListener, YieldListener};
use crate::metrics::{Metrics, MetricsSnapshot};
use concur_core::PrimitiveError;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One `AtomicU64` packs `read`, `claimed`, `written` (see `cursor.rs`).
// Every mutation is a single CAS on that word:
//
// Producer, claim phase: bump `claimed` to reserve `[claimed, claimed+len)`
// for this writer. Producer, write phase: copy bytes into the reserved
// range, then bump `written` to publish, but only once `written` already
// equals this writer's claim start (so writers publish in claim order even
// if their copies finish out of order).
//
// Consumer: drain the contiguous `[read, written)` prefix in one shot, then
// advance `read` to `written` (or reset the whole word to 0 if the buffer
// has fully drained, when `written == claimed`, which is the only point
// cursors move backward).
//
// All state-word loads that feed a subsequent CAS are Acquire; all winning
// CASes are Release (AcqRel on the read side, so a thread that loses a race
// still observes the winner's writes before retrying).
//
// =============================================================================

/// Bounded lock-free MPMC byte FIFO.
///
/// All coordination lives in one `AtomicU64` packing three non-wrapping
/// cursors (`read ≤ written ≤ claimed ≤ capacity`). The backing byte array
/// never wraps: a full drain resets all three cursors to zero instead.
pub struct Buffer {
    state: AtomicU64,
    data: UnsafeCell<Box<[u8]>>,
    bits_per_cursor: u32,
    mask: u64,
    capacity: u64,
    config: BufferConfig,
    metrics: Metrics,
}

// SAFETY: `data` is only ever written within a single writer's exclusively
// claimed `[start, start+len)` range (no two producers' claims overlap,
// enforced by the claim-phase CAS), and only ever read within the published
// `[read, written)` range established by the Acquire/Release protocol above.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Creates a new buffer of `2^size_pow2` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::ExponentTooLarge`] if `size_pow2` exceeds
    /// [`MAX_SIZE_POW2`], the largest exponent for which three
    /// `size_pow2 + 1`-bit cursors fit in one 64-bit word.
    ///
    /// Note: the interface this buffer realizes nominally allows `size_pow2`
    /// up to 21, but three `(k+1)`-bit cursors only fit a 64-bit word up
    /// through `k = 20` (`k = 21` would need `3 * 22 = 66` bits). 20 is the
    /// true maximum the packed layout can represent; see [`MAX_SIZE_POW2`].
    pub fn new(size_pow2: u8) -> Result<Self, PrimitiveError> {
        Self::build(BufferConfig { size_pow2, enable_metrics: false })
    }

    /// Creates a buffer from an explicit [`BufferConfig`].
    ///
    /// # Panics
    ///
    /// Panics if `config.size_pow2` exceeds [`MAX_SIZE_POW2`]. Callers that
    /// want a `Result` instead should go through [`Buffer::new`], or build
    /// the config via [`BufferConfig::new`] first so the panic happens at
    /// config construction rather than here.
    pub fn with_config(config: BufferConfig) -> Self {
        Self::build(config).unwrap_or_else(|e| panic!("Buffer::with_config: {e}"))
    }

    /// Constructs a buffer without threading a `Result` through
    /// construction, for callers who know `size_pow2` is valid and would
    /// rather panic immediately than check a return value, following the
    /// common panic-on-construction `Config::new` pattern. Checked via this
    /// crate's own debug-assertion convention (compiled out of release
    /// builds) rather than an unconditional `assert!`; unlike
    /// `BufferConfig::new`, this can't itself be a `const fn`, since
    /// building a `Buffer` allocates its backing array at a
    /// runtime-determined size, and `const fn` cannot allocate.
    ///
    /// # Panics
    ///
    /// In debug builds, panics immediately if `size_pow2` exceeds
    /// [`MAX_SIZE_POW2`]. In release builds an out-of-range `size_pow2`
    /// still panics, just without the early debug assertion.
    pub fn new_const(size_pow2: u8) -> Self {
        debug_assert!(
            size_pow2 <= MAX_SIZE_POW2,
            "Buffer::new_const: size_pow2 {size_pow2} exceeds MAX_SIZE_POW2 {MAX_SIZE_POW2}"
        );
        Self::build(BufferConfig { size_pow2, enable_metrics: false })
            .unwrap_or_else(|e| panic!("Buffer::new_const: {e}"))
    }

    fn build(config: BufferConfig) -> Result<Self, PrimitiveError> {
        if config.size_pow2 > MAX_SIZE_POW2 {
            return Err(PrimitiveError::ExponentTooLarge {
                got: config.size_pow2,
                max: MAX_SIZE_POW2,
                bits: config.size_pow2 + 1,
            });
        }

        let (bits_per_cursor, mask, capacity) = layout(config.size_pow2);
        let data = vec![0u8; capacity as usize].into_boxed_slice();

        Ok(Self {
            state: AtomicU64::new(0),
            data: UnsafeCell::new(data),
            bits_per_cursor,
            mask,
            capacity,
            config,
            metrics: Metrics::new(),
        })
    }

    /// Returns this buffer's configuration.
    #[inline]
    pub fn config(&self) -> BufferConfig {
        self.config
    }

    /// Returns a point-in-time snapshot of this buffer's operation
    /// counters. All-zero if `config.enable_metrics` is `false`.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Returns the buffer's capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns the number of bytes currently published and available to a
    /// reader (`written - read`). A snapshot; may be stale immediately.
    pub fn len(&self) -> usize {
        let (read, _claimed, written) = self.decode_state();
        (written - read) as usize
    }

    /// Returns true if no bytes are currently published for reading.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn decode_state(&self) -> (u64, u64, u64) {
        decode(self.state.load(Ordering::Acquire), self.bits_per_cursor, self.mask)
    }

    #[inline]
    fn encode_state(&self, read: u64, claimed: u64, written: u64) -> u64 {
        encode(read, claimed, written, self.bits_per_cursor, self.mask)
    }

    /// Writes as many bytes of `src` as there is room for, using the
    /// reference [`YieldListener`] if a writer must wait on an earlier
    /// producer's in-flight publish. Returns the number of bytes written,
    /// `0` if the buffer is full.
    pub fn put(&self, src: &[u8]) -> usize {
        self.put_with_listener(src, &mut YieldListener)
    }

    /// Writes as many bytes of `src` as there is room for, invoking
    /// `listener` each time this writer must wait for an earlier producer's
    /// claim to be published.
    pub fn put_with_listener<L: WaitListener>(&self, src: &[u8], listener: &mut L) -> usize {
        if src.is_empty() {
            return 0;
        }

        // --- Claim phase ---
        let (start_pos, len) = loop {
            let s = self.state.load(Ordering::Acquire);
            let (read, claimed, written) = decode(s, self.bits_per_cursor, self.mask);
            concur_core::debug_assert_cursor_order!(read, written, claimed, self.capacity);

            if claimed == self.capacity {
                return 0;
            }

            let len = (self.capacity - claimed).min(src.len() as u64);
            let new_claimed = claimed + len;
            let s2 = self.encode_state(read, new_claimed, written);

            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break (claimed, len);
            }
            if self.config.enable_metrics {
                self.metrics.add_claim_retry();
            }
        };

        // --- Write phase ---
        // SAFETY: this writer exclusively owns `[start_pos, start_pos+len)`.
        // The claim-phase CAS above reserved it and no other producer's
        // claim can overlap it (claims only ever advance `claimed`
        // forward). No reader can reach these bytes until this writer's
        // publishing CAS below advances `written` past them.
        let dst = unsafe {
            let data = &mut *self.data.get();
            &mut data[start_pos as usize..(start_pos + len) as usize]
        };
        dst.copy_from_slice(&src[..len as usize]);

        loop {
            let s = self.state.load(Ordering::Acquire);
            let (read, claimed, written) = decode(s, self.bits_per_cursor, self.mask);

            if written < start_pos {
                if self.config.enable_metrics {
                    self.metrics.add_publish_wait();
                }
                listener.on_wait();
                continue;
            }

            let new_written = written + len;
            let s2 = self.encode_state(read, claimed, new_written);

            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if self.config.enable_metrics {
                    self.metrics.add_put(len);
                }
                return len as usize;
            }
        }
    }

    /// Drains the full contiguous `[read, written)` prefix into `dest`.
    /// Returns the number of bytes read, `0` if nothing is published.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is shorter than the number of bytes available,
    /// turning what would otherwise be an undersized-destination hazard
    /// into a loud, safe panic.
    pub fn get(&self, dest: &mut [u8]) -> usize {
        loop {
            let s = self.state.load(Ordering::Acquire);
            let (read, claimed, written) = decode(s, self.bits_per_cursor, self.mask);
            concur_core::debug_assert_cursor_order!(read, written, claimed, self.capacity);

            if read == written {
                return 0;
            }

            let n = (written - read) as usize;
            assert!(
                dest.len() >= n,
                "Buffer::get destination too small: need {n}, have {}",
                dest.len()
            );

            // SAFETY: `[read, written)` was published by producers via the
            // Release CAS on `written`; the Acquire load above synchronizes
            // with that, so these bytes are visible and not concurrently
            // written (producers only ever write ahead of `written`).
            unsafe {
                let data = &*self.data.get();
                dest[..n].copy_from_slice(&data[read as usize..written as usize]);
            }

            let s2 = if written == claimed {
                0
            } else {
                self.encode_state(written, claimed, written)
            };

            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if self.config.enable_metrics {
                    self.metrics.add_get(n as u64);
                }
                return n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_rejects_oversized_exponent() {
        let err = Buffer::new(MAX_SIZE_POW2 + 1).unwrap_err();
        assert_eq!(
            err,
            PrimitiveError::ExponentTooLarge {
                got: MAX_SIZE_POW2 + 1,
                max: MAX_SIZE_POW2,
                bits: MAX_SIZE_POW2 + 2,
            }
        );
    }

    #[test]
    fn test_scenario_put_twice_then_get_returns_prefix() {
        let buf = Buffer::new(4).unwrap(); // capacity 16
        assert_eq!(buf.put(&[1, 2, 3, 4, 5]), 5);
        assert_eq!(buf.put(&[6, 7, 8, 9, 10]), 5);

        let mut dest = [0u8; 32];
        let n = buf.get(&mut dest);
        assert_eq!(n, 10);
        assert_eq!(&dest[..10], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let mut dest2 = [0u8; 32];
        assert_eq!(buf.get(&mut dest2), 0);
    }

    #[test]
    fn test_scenario_fill_then_reject_then_reset_then_partial() {
        let buf = Buffer::new(4).unwrap(); // capacity 16
        assert_eq!(buf.put(&[0xAAu8; 16]), 16);
        assert_eq!(buf.put(&[0xAAu8; 1]), 0); // full

        let mut dest = [0u8; 16];
        assert_eq!(buf.get(&mut dest), 16);
        assert_eq!(dest, [0xAAu8; 16]);

        assert_eq!(buf.put(&[1, 2, 3]), 3);
        let mut dest2 = [0u8; 3];
        assert_eq!(buf.get(&mut dest2), 3);
        assert_eq!(dest2, [1, 2, 3]);
    }

    #[test]
    fn test_cursor_invariant_after_put_and_get() {
        let buf = Buffer::new(6).unwrap(); // capacity 64
        buf.put(&[1u8; 20]);
        let (read, claimed, written) = buf.decode_state();
        assert!(read <= written && written <= claimed && claimed <= buf.capacity);

        let mut dest = [0u8; 20];
        buf.get(&mut dest);
        let (read, claimed, written) = buf.decode_state();
        assert!(read <= written && written <= claimed && claimed <= buf.capacity);
    }

    #[test]
    #[should_panic(expected = "destination too small")]
    fn test_get_into_undersized_destination_panics() {
        let buf = Buffer::new(4).unwrap();
        buf.put(&[1, 2, 3, 4]);
        let mut dest = [0u8; 2];
        buf.get(&mut dest);
    }

    #[test]
    fn test_put_empty_slice_is_noop() {
        let buf = Buffer::new(4).unwrap();
        assert_eq!(buf.put(&[]), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_custom_wait_listener_is_invoked() {
        let buf = Buffer::new(2).unwrap(); // capacity 4

        // Single-threaded puts never hit the wait branch (this writer's
        // start position always equals the current `written`); this test
        // exists to document and exercise the closure-based listener API.
        let mut noop = || {};
        assert_eq!(buf.put_with_listener(&[9, 9], &mut noop), 2);
    }

    #[test]
    fn test_metrics_disabled_by_default_stays_zero() {
        let buf = Buffer::new(4).unwrap();
        buf.put(&[1, 2, 3]);
        let mut dest = [0u8; 3];
        buf.get(&mut dest);
        assert_eq!(buf.metrics(), MetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_enabled_counts_puts_and_gets() {
        let buf = Buffer::with_config(BufferConfig::new(4, true));
        buf.put(&[1, 2, 3]);
        buf.put(&[4, 5]);
        let mut dest = [0u8; 5];
        buf.get(&mut dest);

        let snap = buf.metrics();
        assert_eq!(snap.put_calls, 2);
        assert_eq!(snap.bytes_put, 5);
        assert_eq!(snap.get_calls, 1);
        assert_eq!(snap.bytes_got, 5);
    }

    #[test]
    fn test_new_const_builds_a_usable_buffer() {
        let buf = Buffer::new_const(4);
        assert_eq!(buf.put(&[1, 2, 3]), 3);
    }

    #[test]
    #[should_panic(expected = "Buffer::with_config")]
    fn test_with_config_panics_on_oversized_exponent() {
        Buffer::with_config(BufferConfig { size_pow2: MAX_SIZE_POW2 + 1, enable_metrics: false });
    }
}

//! Debug assertion macros for the concur-* primitives' coordination-word invariants.
//!
//! These macros provide runtime checks for the invariants documented in the
//! crate-level design notes. They are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release builds.

// =============================================================================
// INV-MIR-01: Seqlock Parity
// =============================================================================

/// Assert the mirror's quiescent/in-progress counter relationship.
///
/// **Invariant**: `before == after` (quiescent) or `before == after + 1`
/// (write in flight).
///
/// Used in: `Mirror::write`
#[macro_export]
macro_rules! debug_assert_seqlock_parity {
    ($before:expr, $after:expr) => {
        debug_assert!(
            $before == $after || $before == $after.wrapping_add(1),
            "INV-MIR-01 violated: before {} and after {} are not a valid seqlock pair",
            $before,
            $after
        )
    };
}

/// Assert the mirror's single-writer contract: the publishing CAS on `after`
/// must succeed from the value this writer observed before the copy.
///
/// Used in: `Mirror::write`
#[macro_export]
macro_rules! debug_assert_single_writer {
    ($cas_succeeded:expr) => {
        debug_assert!(
            $cas_succeeded,
            "INV-MIR-02 violated: Mirror::write's CAS on `after` failed, a second concurrent writer exists"
        )
    };
}

// =============================================================================
// INV-BUF-01: Cursor Ordering
// =============================================================================

/// Assert the buffer's packed-cursor ordering invariant.
///
/// **Invariant**: `read ≤ written ≤ claimed ≤ capacity`
///
/// Used in: `Buffer::put`, `Buffer::get`
#[macro_export]
macro_rules! debug_assert_cursor_order {
    ($read:expr, $written:expr, $claimed:expr, $capacity:expr) => {
        debug_assert!(
            $read <= $written && $written <= $claimed && $claimed <= $capacity,
            "INV-BUF-01 violated: read {} <= written {} <= claimed {} <= capacity {} does not hold",
            $read,
            $written,
            $claimed,
            $capacity
        )
    };
}

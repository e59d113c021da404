//! Optional operation counters for [`Bag`](crate::Bag), gathered behind
//! [`BagConfig::enable_metrics`](crate::BagConfig::enable_metrics).

use std::sync::atomic::{AtomicU64, Ordering};

/// Live, atomics-backed operation counters.
///
/// Internal accumulator. Callers never see this directly, only the
/// [`MetricsSnapshot`] returned by `Bag::metrics()`.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    items_stored: AtomicU64,
    items_removed: AtomicU64,
    store_calls: AtomicU64,
    remove_calls: AtomicU64,
    claim_retries: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_stored(&self, n: u64) {
        self.store_calls.fetch_add(1, Ordering::Relaxed);
        self.items_stored.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_removed(&self, n: u64) {
        self.remove_calls.fetch_add(1, Ordering::Relaxed);
        self.items_removed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_claim_retry(&self) {
        self.claim_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            store_calls: self.store_calls.load(Ordering::Relaxed),
            remove_calls: self.remove_calls.load(Ordering::Relaxed),
            items_stored: self.items_stored.load(Ordering::Relaxed),
            items_removed: self.items_removed.load(Ordering::Relaxed),
            claim_retries: self.claim_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of a [`Bag`](crate::Bag)'s operation counters.
/// All-zero if metrics were never enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub store_calls: u64,
    pub remove_calls: u64,
    pub items_stored: u64,
    pub items_removed: u64,
    pub claim_retries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_counts() {
        let m = Metrics::new();
        m.add_stored(1);
        m.add_stored(4);
        m.add_removed(2);
        m.add_claim_retry();

        let snap = m.snapshot();
        assert_eq!(snap.store_calls, 2);
        assert_eq!(snap.items_stored, 5);
        assert_eq!(snap.remove_calls, 1);
        assert_eq!(snap.items_removed, 2);
        assert_eq!(snap.claim_retries, 1);
    }
}

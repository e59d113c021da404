//! Optional operation counters for [`Buffer`](crate::Buffer), gathered
//! behind [`BufferConfig::enable_metrics`](crate::BufferConfig::enable_metrics).

use std::sync::atomic::{AtomicU64, Ordering};

/// Live, atomics-backed operation counters.
///
/// Internal accumulator. Callers never see this directly, only the
/// [`MetricsSnapshot`] returned by `Buffer::metrics()`.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    put_calls: AtomicU64,
    get_calls: AtomicU64,
    bytes_put: AtomicU64,
    bytes_got: AtomicU64,
    claim_retries: AtomicU64,
    publish_waits: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_put(&self, bytes: u64) {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_put.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_get(&self, bytes: u64) {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_got.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_claim_retry(&self) {
        self.claim_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_publish_wait(&self) {
        self.publish_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            put_calls: self.put_calls.load(Ordering::Relaxed),
            get_calls: self.get_calls.load(Ordering::Relaxed),
            bytes_put: self.bytes_put.load(Ordering::Relaxed),
            bytes_got: self.bytes_got.load(Ordering::Relaxed),
            claim_retries: self.claim_retries.load(Ordering::Relaxed),
            publish_waits: self.publish_waits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of a [`Buffer`](crate::Buffer)'s operation
/// counters. All-zero if metrics were never enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub put_calls: u64,
    pub get_calls: u64,
    pub bytes_put: u64,
    pub bytes_got: u64,
    pub claim_retries: u64,
    pub publish_waits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_counts() {
        let m = Metrics::new();
        m.add_put(5);
        m.add_put(3);
        m.add_get(4);
        m.add_claim_retry();
        m.add_publish_wait();

        let snap = m.snapshot();
        assert_eq!(snap.put_calls, 2);
        assert_eq!(snap.bytes_put, 8);
        assert_eq!(snap.get_calls, 1);
        assert_eq!(snap.bytes_got, 4);
        assert_eq!(snap.claim_retries, 1);
        assert_eq!(snap.publish_waits, 1);
    }

    #[test]
    fn test_default_snapshot_is_all_zero() {
        assert_eq!(MetricsSnapshot::default(), MetricsSnapshot::default());
        assert_eq!(MetricsSnapshot::default().put_calls, 0);
    }
}

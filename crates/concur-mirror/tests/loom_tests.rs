//! Loom-based concurrency tests for concur-mirror's seqlock protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

/// Minimal seqlock over a single `u64` payload, modeling `Mirror<u64>`'s
/// protocol directly against loom's atomics and cell types.
struct LoomMirror {
    value: UnsafeCell<u64>,
    before: AtomicU64,
    after: AtomicU64,
}

unsafe impl Send for LoomMirror {}
unsafe impl Sync for LoomMirror {}

impl LoomMirror {
    fn new(initial: u64) -> Self {
        Self {
            value: UnsafeCell::new(initial),
            before: AtomicU64::new(0),
            after: AtomicU64::new(0),
        }
    }

    fn write(&self, v: u64) {
        let b = self.before.fetch_add(1, Ordering::Release);
        self.value.with_mut(|p| unsafe { *p = v });
        let ok = self
            .after
            .compare_exchange(b, b + 1, Ordering::Release, Ordering::Relaxed)
            .is_ok();
        assert!(ok, "single-writer contract violated");
    }

    fn read(&self) -> u64 {
        loop {
            let rev = self.after.load(Ordering::Acquire);
            let v = self.value.with(|p| unsafe { *p });
            if self.before.load(Ordering::Acquire) == rev {
                return v;
            }
        }
    }
}

#[test]
fn loom_reader_never_observes_torn_write() {
    loom::model(|| {
        let mirror = Arc::new(LoomMirror::new(0));

        let writer_mirror = Arc::clone(&mirror);
        let writer = thread::spawn(move || {
            writer_mirror.write(7);
        });

        let reader_mirror = Arc::clone(&mirror);
        let reader = thread::spawn(move || reader_mirror.read());

        writer.join().unwrap();
        let observed = reader.join().unwrap();

        assert!(observed == 0 || observed == 7, "observed {observed}");
    });
}

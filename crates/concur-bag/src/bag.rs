use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::BagConfig;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::slot_state::{set_slot, slot_get, CLAIMED, FREE, FULL, REMOVING, SLOT_COUNT};

/// A bounded, unordered, lock-free MPMC container for up to 32 items.
///
/// All coordination lives in a single `AtomicU64`: two bits per slot encode
/// that slot's lifecycle state (`FREE`/`CLAIMED`/`FULL`/`REMOVING`). The
/// payload array is a plain, non-atomic side table. Every transition into
/// or out of `FULL` is gated by a CAS on the state word, so at most one
/// thread ever has license to touch a given slot's payload at a time for
/// `store`/`remove`.
///
/// `get` and `copy_to` are the exception: they read a slot's payload without
/// taking it out of `FULL`, so a concurrent `store` reusing that slot (after
/// a remove) can race with the read. Such readers are documented to see "a
/// possibly-stale reference," acceptable because the intended payloads are
/// long-lived objects the caller keeps valid for the bag's lifetime, not
/// values reclaimed the instant they're superseded. Memory reclamation of
/// payloads is out of scope, as for `Pool`.
pub struct Bag<T> {
    state: AtomicU64,
    storage: [UnsafeCell<Option<T>>; SLOT_COUNT],
    config: BagConfig,
    metrics: Metrics,
}

unsafe impl<T: Send> Send for Bag<T> {}
unsafe impl<T: Send> Sync for Bag<T> {}

impl<T> Bag<T> {
    pub fn new() -> Self {
        Self::with_config(BagConfig::default())
    }

    /// Creates a bag from an explicit [`BagConfig`].
    pub fn with_config(config: BagConfig) -> Self {
        Self {
            state: AtomicU64::new(0),
            storage: std::array::from_fn(|_| UnsafeCell::new(None)),
            config,
            metrics: Metrics::new(),
        }
    }

    /// Returns this bag's configuration.
    #[inline]
    pub fn config(&self) -> BagConfig {
        self.config
    }

    /// Returns a point-in-time snapshot of this bag's operation counters.
    /// All-zero if `config.enable_metrics` is `false`.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Number of slots currently `FULL`, as of one snapshot. Can be stale
    /// the instant it's returned under concurrent use.
    pub fn size(&self) -> usize {
        let s = self.state.load(Ordering::Acquire);
        (0..SLOT_COUNT).filter(|&i| slot_get(s, i) == FULL).count()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Claims one `FREE` slot, installs `item`, and publishes it as `FULL`.
    /// Returns `false` if no slot was free.
    pub fn store(&self, item: T) -> bool {
        let Some(i) = self.claim_one_free() else {
            return false;
        };

        // SAFETY: slot `i` is exclusively ours. The CAS in
        // `claim_one_free` that moved it FREE -> CLAIMED is the only way in
        // or out of CLAIMED, and only the thread that won that CAS reaches
        // here for this slot.
        unsafe {
            *self.storage[i].get() = Some(item);
        }

        self.publish_one(i);
        if self.config.enable_metrics {
            self.metrics.add_stored(1);
        }
        true
    }

    /// Stores as many of `items` as there is room for (up to 32 total free
    /// slots), starting from `items[0]`. Returns the number actually stored.
    pub fn store_batch(&self, items: &[T]) -> usize
    where
        T: Clone,
    {
        self.store_batch_at(items, 0, items.len())
    }

    /// Stores up to `num` items from `items[start..]`. Returns the number
    /// actually stored (bounded by both `num` and the number of free slots
    /// visible in one snapshot).
    pub fn store_batch_at(&self, items: &[T], start: usize, num: usize) -> usize
    where
        T: Clone,
    {
        let want = num.min(items.len().saturating_sub(start)).min(SLOT_COUNT);
        if want == 0 {
            return 0;
        }

        let chosen = loop {
            let s = self.state.load(Ordering::Acquire);
            let mut chosen = Vec::with_capacity(want);
            for i in 0..SLOT_COUNT {
                if chosen.len() >= want {
                    break;
                }
                if slot_get(s, i) == FREE {
                    chosen.push(i);
                }
            }
            if chosen.is_empty() {
                return 0;
            }

            // Derive the next word by clearing and resetting each chosen
            // slot's own two bits individually, never by ORing a
            // precomputed "stored mask" into the raw word. That approach
            // corrupts any chosen slot whose prior field had a bit the new
            // value leaves zero.
            let mut s2 = s;
            for &i in &chosen {
                s2 = set_slot(s2, i, CLAIMED);
            }

            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break chosen;
            }
        };

        for (k, &i) in chosen.iter().enumerate() {
            // SAFETY: each chosen slot was just moved FREE -> CLAIMED by the
            // CAS above, under our exclusive ownership until we publish it.
            unsafe {
                *self.storage[i].get() = Some(items[start + k].clone());
            }
        }

        loop {
            let s = self.state.load(Ordering::Acquire);
            let mut s2 = s;
            for &i in &chosen {
                s2 = set_slot(s2, i, FULL);
            }
            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::Release, Ordering::Acquire)
                .is_ok()
            {
                if self.config.enable_metrics {
                    self.metrics.add_stored(chosen.len() as u64);
                }
                return chosen.len();
            }
        }
    }

    /// Claims one `FULL` slot, detaches its payload, and frees the slot.
    pub fn remove(&self) -> Option<T> {
        let i = self.claim_one_full()?;

        // SAFETY: slot `i` is exclusively ours while REMOVING. Only the
        // thread that won the FULL -> REMOVING CAS reaches here for it.
        let value = unsafe { (*self.storage[i].get()).take() };

        self.free_one(i);
        if self.config.enable_metrics {
            self.metrics.add_removed(1);
        }
        value
    }

    /// Removes up to `dest.len()` items into `dest`, starting at index 0.
    /// Returns the number removed.
    pub fn remove_to(&self, dest: &mut [Option<T>]) -> usize
    where
        T: Clone,
    {
        self.remove_to_at(dest, 0, dest.len())
    }

    /// Removes up to `num` items into `dest[start..]`. Returns the number
    /// actually removed.
    ///
    /// This path skips the `REMOVING` intermediate state entirely and
    /// transitions selected slots straight `FULL -> FREE` in one CAS. That
    /// means the committed-removal check (the CAS) must happen *before* the
    /// slot is touched as "ours," so payloads are read speculatively off a
    /// still-`FULL` slot and only kept if our CAS wins; a losing attempt
    /// discards its speculative clones and retries from a fresh snapshot.
    /// Consequently this path, unlike single-item `remove`, requires
    /// `T: Clone` and does not null the storage entry. Nulling after the
    /// CAS would race a new `store` that claims the freshly-freed slot
    /// before we get to it.
    pub fn remove_to_at(&self, dest: &mut [Option<T>], start: usize, num: usize) -> usize
    where
        T: Clone,
    {
        let want = num.min(dest.len().saturating_sub(start)).min(SLOT_COUNT);
        if want == 0 {
            return 0;
        }

        loop {
            let s = self.state.load(Ordering::Acquire);
            let mut chosen = Vec::with_capacity(want);
            for i in 0..SLOT_COUNT {
                if chosen.len() >= want {
                    break;
                }
                if slot_get(s, i) == FULL {
                    chosen.push(i);
                }
            }
            if chosen.is_empty() {
                return 0;
            }

            // SAFETY: reading a FULL slot's payload without exclusive
            // ownership can race a concurrent remover reading the same
            // slot, or (if this attempt loses its CAS and the slot is
            // later reused) a future store overwriting it. Both are
            // accepted per this type's documented stale-read contract;
            // this attempt's clones are discarded entirely unless the CAS
            // below commits them.
            let values: Vec<T> = chosen
                .iter()
                .map(|&i| unsafe {
                    (*self.storage[i].get())
                        .clone()
                        .expect("slot observed FULL must hold a value")
                })
                .collect();

            let mut s2 = s;
            for &i in &chosen {
                s2 = set_slot(s2, i, FREE);
            }

            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                for (k, v) in values.into_iter().enumerate() {
                    dest[start + k] = Some(v);
                }
                if self.config.enable_metrics {
                    self.metrics.add_removed(chosen.len() as u64);
                }
                return chosen.len();
            }
        }
    }

    /// Non-destructive peek at the first `FULL` slot's payload, cloned.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        let s = self.state.load(Ordering::Acquire);
        for i in 0..SLOT_COUNT {
            if slot_get(s, i) == FULL {
                // SAFETY: see the type-level doc comment. A concurrent
                // store/remove touching this slot is an accepted benign
                // race under this type's stale-read contract.
                return unsafe { (*self.storage[i].get()).clone() };
            }
        }
        None
    }

    /// Non-destructive copy of up to `dest.len()` `FULL` payloads into
    /// `dest`, starting at index 0. Returns the number copied.
    pub fn copy_to(&self, dest: &mut [Option<T>]) -> usize
    where
        T: Clone,
    {
        self.copy_to_at(dest, 0, dest.len())
    }

    /// Non-destructive copy of up to `num` `FULL` payloads into
    /// `dest[start..]`. Returns the number copied.
    pub fn copy_to_at(&self, dest: &mut [Option<T>], start: usize, num: usize) -> usize
    where
        T: Clone,
    {
        let want = num.min(dest.len().saturating_sub(start)).min(SLOT_COUNT);
        if want == 0 {
            return 0;
        }
        let s = self.state.load(Ordering::Acquire);
        let mut copied = 0;
        for i in 0..SLOT_COUNT {
            if copied >= want {
                break;
            }
            if slot_get(s, i) == FULL {
                // SAFETY: same stale-read contract as `get`.
                let value = unsafe { (*self.storage[i].get()).clone() };
                dest[start + copied] = value;
                copied += 1;
            }
        }
        copied
    }

    fn claim_one_free(&self) -> Option<usize> {
        loop {
            let s = self.state.load(Ordering::Acquire);
            let i = (0..SLOT_COUNT).find(|&i| slot_get(s, i) == FREE)?;
            let s2 = set_slot(s, i, CLAIMED);
            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(i);
            }
            if self.config.enable_metrics {
                self.metrics.add_claim_retry();
            }
        }
    }

    fn claim_one_full(&self) -> Option<usize> {
        loop {
            let s = self.state.load(Ordering::Acquire);
            let i = (0..SLOT_COUNT).find(|&i| slot_get(s, i) == FULL)?;
            let s2 = set_slot(s, i, REMOVING);
            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(i);
            }
            if self.config.enable_metrics {
                self.metrics.add_claim_retry();
            }
        }
    }

    fn publish_one(&self, i: usize) {
        loop {
            let s = self.state.load(Ordering::Acquire);
            let s2 = set_slot(s, i, FULL);
            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::Release, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    fn free_one(&self, i: usize) {
        loop {
            let s = self.state.load(Ordering::Acquire);
            let s2 = set_slot(s, i, FREE);
            if self
                .state
                .compare_exchange_weak(s, s2, Ordering::Release, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }
}

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Concurrent Primitives - lock-free single-word-coordinated building blocks
//!
//! Four small primitives, each using a single atomic word (or a pair of
//! them, for the seqlock) to coordinate concurrent access without locks:
//!
//! - [`pool`]: an unbounded MPMC LIFO object pool (Treiber stack).
//! - [`mirror`]: a wait-free single-writer/multi-reader seqlock snapshot.
//! - [`buffer`]: a bounded MPMC byte ring with packed read/claimed/written
//!   cursors.
//! - [`bag`]: a bounded 32-slot MPMC unordered container with per-slot state
//!   packed into one word.
//!
//! This crate is a thin re-export facade; the actual implementations live in
//! `concur-pool`, `concur-mirror`, `concur-buffer`, and `concur-bag`, each
//! independently usable and independently `loom`-testable.
//!
//! # Example
//!
//! ```
//! use concur_primitives::pool::Pool;
//!
//! let pool: Pool<i32> = Pool::new();
//! pool.release(Box::new(concur_primitives::pool::Wrapper::new(7)));
//! let item = pool.acquire().unwrap();
//! assert_eq!(*item.payload(), 7);
//! ```

pub use concur_core::{Backoff, PrimitiveError};

pub mod pool {
    pub use concur_pool::{Pool, Wrapper};
}

pub mod mirror {
    pub use concur_mirror::{Image, Mirror, MirrorFrom};
}

pub mod buffer {
    pub use concur_buffer::{
        Buffer, BufferConfig, MetricsSnapshot, WaitListener, YieldListener, MAX_SIZE_POW2,
    };
}

pub mod bag {
    pub use concur_bag::{Bag, BagConfig, MetricsSnapshot, SLOT_COUNT};
}

//! Bounded lock-free MPMC byte FIFO with a single packed coordination word.
//!
//! `Buffer` packs three non-wrapping cursors (`read`, `claimed`, `written`)
//! into one `AtomicU64`. Producers claim a range, copy into it, then publish
//! in claim order; consumers drain the published contiguous prefix in one
//! shot. See [`cursor`] for the bit layout and [`MAX_SIZE_POW2`] for the
//! largest supported size exponent.
//!
//! # Example
//!
//! ```
//! use concur_buffer::Buffer;
//!
//! let buf = Buffer::new(4).unwrap(); // 16-byte capacity
//! assert_eq!(buf.put(&[1, 2, 3]), 3);
//!
//! let mut dest = [0u8; 3];
//! assert_eq!(buf.get(&mut dest), 3);
//! assert_eq!(dest, [1, 2, 3]);
//! ```

mod buffer;
mod config;
mod cursor;
mod listener;
mod metrics;

pub use buffer::Buffer;
pub use config::BufferConfig;
pub use cursor::MAX_SIZE_POW2;
pub use listener::{WaitListener, YieldListener};
pub use metrics::MetricsSnapshot;

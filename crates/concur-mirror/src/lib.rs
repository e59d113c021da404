//! Single-writer / many-reader seqlock snapshot of a user-defined image.
//!
//! `Mirror<T>` double-buffers a typed image using a seqlock-like protocol
//! over two atomic counters (`before`/`after`). Readers never block and
//! never observe a torn copy: they retry until the counters confirm the
//! snapshot they just copied was not concurrently invalidated.
//!
//! # Example
//!
//! ```
//! use concur_mirror::{Image, Mirror};
//!
//! let mirror = Mirror::new(Image(0i64));
//! mirror.write(&Image(42)).unwrap();
//!
//! let mut into = Image(0i64);
//! mirror.read(&mut into).unwrap();
//! assert_eq!(into.0, 42);
//! ```

mod image;
mod mirror;

pub use image::{Image, MirrorFrom};
pub use mirror::Mirror;

//! Construction-time configuration for [`Buffer`](crate::Buffer).

use crate::cursor::MAX_SIZE_POW2;

/// Configuration for [`Buffer`](crate::Buffer).
///
/// Plain and `Copy`, like the ring-buffer primitive this crate's ambient
/// stack is modeled on: build one with a struct literal, or with
/// [`BufferConfig::new`] if you want the `size_pow2` bound checked where the
/// config is constructed rather than where the buffer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Buffer size as a power of two; capacity is `2^size_pow2` bytes.
    pub size_pow2: u8,
    /// Enable metrics collection (adds a branch and a few atomic increments
    /// per `put`/`get`).
    pub enable_metrics: bool,
}

impl BufferConfig {
    /// Creates a new configuration.
    ///
    /// # Panics
    ///
    /// Panics if `size_pow2` exceeds [`MAX_SIZE_POW2`].
    pub const fn new(size_pow2: u8, enable_metrics: bool) -> Self {
        assert!(size_pow2 <= MAX_SIZE_POW2, "size_pow2 exceeds MAX_SIZE_POW2");
        Self { size_pow2, enable_metrics }
    }
}

impl Default for BufferConfig {
    /// 64 KiB capacity, metrics disabled.
    fn default() -> Self {
        Self { size_pow2: 16, enable_metrics: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_within_bounds() {
        let config = BufferConfig::default();
        assert!(config.size_pow2 <= MAX_SIZE_POW2);
        assert!(!config.enable_metrics);
    }

    #[test]
    #[should_panic(expected = "size_pow2 exceeds MAX_SIZE_POW2")]
    fn test_new_rejects_oversized_exponent() {
        BufferConfig::new(MAX_SIZE_POW2 + 1, false);
    }
}

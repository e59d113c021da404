//! Construction-time configuration for [`Bag`](crate::Bag).

/// Configuration for [`Bag`](crate::Bag).
///
/// `Bag` has a fixed 32-slot capacity, so there's no size bound to assert
/// here (unlike `concur-buffer`'s `BufferConfig::size_pow2`).
/// `enable_metrics` is the only knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagConfig {
    /// Enable metrics collection (adds a branch and a few atomic increments
    /// per `store`/`remove`).
    pub enable_metrics: bool,
}

impl BagConfig {
    /// Creates a new configuration.
    pub const fn new(enable_metrics: bool) -> Self {
        Self { enable_metrics }
    }
}

impl Default for BagConfig {
    fn default() -> Self {
        Self { enable_metrics: false }
    }
}

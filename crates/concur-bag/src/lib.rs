//! A bounded 32-slot lock-free MPMC unordered container.
//!
//! See [`Bag`] for the full protocol description.

mod bag;
mod config;
mod metrics;
mod slot_state;

pub use bag::Bag;
pub use config::BagConfig;
pub use metrics::MetricsSnapshot;
pub use slot_state::SLOT_COUNT;

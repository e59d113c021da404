//! Ambient stack shared by the `concur-*` lock-free primitives.
//!
//! Each primitive packs its coordination state into a single atomic word and
//! is otherwise independent of the others (see the workspace-level design
//! notes). What they do share is this small set of cross-cutting concerns:
//! an adaptive spin/yield [`Backoff`], a [`PrimitiveError`] taxonomy for the
//! handful of precondition violations that are genuine programmer errors,
//! and the `debug_assert_*!` invariant macros used by every primitive's hot
//! path.

mod backoff;
mod error;
pub mod invariants;

pub use backoff::Backoff;
pub use error::PrimitiveError;

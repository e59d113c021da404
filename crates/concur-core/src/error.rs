use thiserror::Error;

/// Programmer-error conditions shared across the `concur-*` primitives.
///
/// These are precondition violations, not normal control flow. A pool going
/// empty, a buffer going full, or a bag going empty are ordinary return
/// values (`None`, `0`, `false`) documented on each primitive, never routed
/// through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// A `Buffer` was constructed with `size_pow2` exceeding the maximum
    /// supported by the packed cursor layout.
    #[error("buffer size_pow2 {got} exceeds max {max} (three {bits}-bit cursors must fit in 63 bits)")]
    ExponentTooLarge { got: u8, max: u8, bits: u8 },
    /// A `Mirror::write`/`Mirror::read` call was passed the mirror's own
    /// `initial` image as the source/destination argument.
    #[error("mirror write/read called with the mirror's own initial image as argument")]
    SelfMirror,
    /// `Mirror::write`'s publishing CAS on `after` failed, meaning a second
    /// concurrent writer exists in violation of the single-writer contract.
    #[error("concurrent Mirror writer detected: the single-writer contract was violated")]
    ConcurrentWriterDetected,
}

//! Error types for the multiplication engines.
//!
//! Insufficient memory and odd matrix sizes are not errors: every
//! engine recovers locally by falling back to the direct product.
//! Only conditions that cannot be recovered in place surface here.

/// Error type for engine-level failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A wire buffer does not match the expected matrix shape.
    #[error("buffer of length {got} does not form a {side}x{side} matrix")]
    BufferShape {
        /// Expected side length.
        side: usize,
        /// Actual buffer length.
        got: usize,
    },
}

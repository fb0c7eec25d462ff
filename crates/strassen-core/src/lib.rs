//! # strassen-core
//!
//! Memory-adaptive Strassen matrix multiplication over square integer
//! matrices. Provides the recursive decomposition, a memory-budget
//! heuristic that decides at every recursion step whether to keep
//! recursing or fall back to the cubic direct product, and two engines
//! built on top: a single-threaded recursive one and a fork-join
//! parallel one bounded by a memory-derived maximum depth.

pub mod codec;
pub mod error;
pub mod matrix;
pub mod memory;
pub mod ops;
pub mod parallel;
pub mod sequential;
pub mod tasks;

// Re-exports
pub use error::EngineError;
pub use matrix::Matrix;
pub use memory::{FixedProbe, MemoryBudget, MemoryProbe, SystemProbe};
pub use parallel::ParallelEngine;
pub use sequential::SequentialEngine;

/// Multiply two square matrices with the sequential Strassen engine.
///
/// This is a convenience function for simple use cases. For an injected
/// memory probe or the parallel engine, construct the engines directly.
///
/// # Example
/// ```
/// use strassen_core::Matrix;
///
/// let a = Matrix::from_rows(&[vec![1, 2], vec![3, 4]]);
/// let c = strassen_core::multiply(&a, &a);
/// assert_eq!(c, Matrix::from_rows(&[vec![7, 10], vec![15, 22]]));
/// ```
#[must_use]
pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    use std::sync::Arc;

    let budget = MemoryBudget::new(Arc::new(SystemProbe::new()));
    SequentialEngine::new(budget).multiply(a, b)
}

//! Row-major flattening of matrices for the message-passing boundary.
//!
//! `flat[i * n + j] == matrix[(i, j)]`.

use crate::error::EngineError;
use crate::matrix::Matrix;

/// Flatten a matrix into a row-major linear buffer.
#[must_use]
pub fn flatten(m: &Matrix) -> Vec<i32> {
    m.as_slice().to_vec()
}

/// Rebuild an `n`x`n` matrix from a row-major buffer.
///
/// # Errors
/// Returns [`EngineError::BufferShape`] if the buffer length is not
/// `n * n`.
pub fn unflatten(flat: Vec<i32>, n: usize) -> Result<Matrix, EngineError> {
    if flat.len() != n * n {
        return Err(EngineError::BufferShape {
            side: n,
            got: flat.len(),
        });
    }
    Ok(Matrix::from_raw(n, flat))
}

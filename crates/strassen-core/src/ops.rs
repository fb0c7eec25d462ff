//! Dense square-matrix primitives: elementwise arithmetic, the cubic
//! direct product, and quadrant extraction/joining.
//!
//! All functions allocate fresh outputs; inputs are never mutated.
//! Dimension mismatches are programmer errors and panic.

use crate::matrix::Matrix;

/// Elementwise sum of two equally sized matrices.
#[must_use]
pub fn add(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.size(), b.size(), "operand dimensions must match");
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| x + y)
        .collect();
    Matrix::from_raw(a.size(), data)
}

/// Elementwise difference of two equally sized matrices.
#[must_use]
pub fn subtract(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.size(), b.size(), "operand dimensions must match");
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| x - y)
        .collect();
    Matrix::from_raw(a.size(), data)
}

/// Direct triple-loop product, O(n^3). Base case and universal fallback.
#[must_use]
pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.size();
    assert_eq!(n, b.size(), "operand dimensions must match");
    let mut c = Matrix::zeros(n);
    for i in 0..n {
        for k in 0..n {
            let aik = a[(i, k)];
            for j in 0..n {
                c[(i, j)] += aik * b[(k, j)];
            }
        }
    }
    c
}

/// Copy a `size`x`size` block out of `parent` at the given offset.
///
/// The result is a fresh matrix, not a view; later mutation of the
/// parent never affects it.
#[must_use]
pub fn extract(parent: &Matrix, row_off: usize, col_off: usize, size: usize) -> Matrix {
    let mut block = Matrix::zeros(size);
    for i in 0..size {
        for j in 0..size {
            block[(i, j)] = parent[(row_off + i, col_off + j)];
        }
    }
    block
}

/// Write `block` into `dest` at the given offset. `dest` must already
/// be sized to hold it.
pub fn join(dest: &mut Matrix, block: &Matrix, row_off: usize, col_off: usize) {
    for i in 0..block.size() {
        for j in 0..block.size() {
            dest[(row_off + i, col_off + j)] = block[(i, j)];
        }
    }
}

/// The four n/2 x n/2 blocks of an even-sized matrix.
#[derive(Debug, Clone)]
pub struct Quadrants {
    pub q11: Matrix,
    pub q12: Matrix,
    pub q21: Matrix,
    pub q22: Matrix,
}

/// Split an even-sized matrix into its four quadrants (copies).
#[must_use]
pub fn quadrants(m: &Matrix) -> Quadrants {
    let half = m.size() / 2;
    Quadrants {
        q11: extract(m, 0, 0, half),
        q12: extract(m, 0, half, half),
        q21: extract(m, half, 0, half),
        q22: extract(m, half, half, half),
    }
}

//! Square integer matrix with row-major storage.

use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;

/// A dense square matrix of `i32` values, stored row-major.
///
/// Engines never mutate an input matrix; every operation allocates a
/// fresh output. Operand matrices must share the same side length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    data: Vec<i32>,
}

impl Matrix {
    /// Create a zero-filled `n`x`n` matrix.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            size: n,
            data: vec![0; n * n],
        }
    }

    /// Create the `n`x`n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m[(i, i)] = 1;
        }
        m
    }

    /// Create an `n`x`n` matrix of uniform random values in `1..=10`.
    #[must_use]
    pub fn random(n: usize) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            size: n,
            data: (0..n * n).map(|_| rng.gen_range(1..=10)).collect(),
        }
    }

    /// Build a matrix from row vectors.
    ///
    /// # Panics
    /// Panics if the rows do not form a square grid.
    #[must_use]
    pub fn from_rows(rows: &[Vec<i32>]) -> Self {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            assert_eq!(row.len(), n, "rows must form a square matrix");
            data.extend_from_slice(row);
        }
        Self { size: n, data }
    }

    /// Reconstruct a matrix from an owned row-major buffer.
    ///
    /// The caller guarantees `data.len() == n * n`; `codec::unflatten`
    /// is the checked entry point for wire data.
    #[must_use]
    pub(crate) fn from_raw(n: usize, data: Vec<i32>) -> Self {
        debug_assert_eq!(data.len(), n * n);
        Self { size: n, data }
    }

    /// Side length of the matrix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major view of the element buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = i32;

    fn index(&self, (row, col): (usize, usize)) -> &i32 {
        &self.data[row * self.size + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut i32 {
        &mut self.data[row * self.size + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.size.max(1)) {
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_are_zero() {
        let m = Matrix::zeros(3);
        assert_eq!(m.size(), 3);
        assert!(m.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn identity_diagonal() {
        let id = Matrix::identity(4);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(id[(i, j)], i32::from(i == j));
            }
        }
    }

    #[test]
    fn random_values_in_range() {
        let m = Matrix::random(8);
        assert!(m.as_slice().iter().all(|&v| (1..=10).contains(&v)));
    }

    #[test]
    fn from_rows_round_trips_indexing() {
        let m = Matrix::from_rows(&[vec![1, 2], vec![3, 4]]);
        assert_eq!(m[(0, 0)], 1);
        assert_eq!(m[(0, 1)], 2);
        assert_eq!(m[(1, 0)], 3);
        assert_eq!(m[(1, 1)], 4);
    }

    #[test]
    #[should_panic(expected = "square")]
    fn from_rows_rejects_ragged() {
        let _ = Matrix::from_rows(&[vec![1, 2], vec![3]]);
    }

    #[test]
    fn display_rows() {
        let m = Matrix::from_rows(&[vec![1, 2], vec![3, 4]]);
        assert_eq!(m.to_string(), "1 2\n3 4\n");
    }
}

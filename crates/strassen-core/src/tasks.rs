//! The seven canonical Strassen sub-products and their recombination.
//!
//! Task operand table (quadrants of A and B):
//!
//! | Task | Left      | Right     |
//! |------|-----------|-----------|
//! | 1    | A11 + A22 | B11 + B22 |
//! | 2    | A21 + A22 | B11       |
//! | 3    | A11       | B12 - B22 |
//! | 4    | A22       | B21 - B11 |
//! | 5    | A11 + A12 | B22       |
//! | 6    | A21 - A11 | B11 + B12 |
//! | 7    | A12 - A22 | B21 + B22 |
//!
//! Output quadrants: C11 = M1 + M4 - M5 + M7, C12 = M3 + M5,
//! C21 = M2 + M4, C22 = M1 - M2 + M3 + M6.
//!
//! Every task's inputs are pure functions of the immutable input
//! quadrants; no task depends on another task's output.

use crate::matrix::Matrix;
use crate::ops::{self, Quadrants};

/// Number of Strassen sub-products per decomposition level.
pub const NUM_TASKS: usize = 7;

/// Left and right operands of task `task` (1-based), as fresh matrices.
///
/// # Panics
/// Panics if `task` is not in `1..=7`.
#[must_use]
pub fn operands(task: usize, a: &Quadrants, b: &Quadrants) -> (Matrix, Matrix) {
    match task {
        1 => (ops::add(&a.q11, &a.q22), ops::add(&b.q11, &b.q22)),
        2 => (ops::add(&a.q21, &a.q22), b.q11.clone()),
        3 => (a.q11.clone(), ops::subtract(&b.q12, &b.q22)),
        4 => (a.q22.clone(), ops::subtract(&b.q21, &b.q11)),
        5 => (ops::add(&a.q11, &a.q12), b.q22.clone()),
        6 => (ops::subtract(&a.q21, &a.q11), ops::add(&b.q11, &b.q12)),
        7 => (ops::subtract(&a.q12, &a.q22), ops::add(&b.q21, &b.q22)),
        _ => panic!("invalid Strassen task: {task}"),
    }
}

/// Combine the seven sub-products into the full `n`x`n` result.
///
/// `products[i]` holds M(i+1).
///
/// # Panics
/// Panics if `products` does not hold exactly seven matrices.
#[must_use]
pub fn assemble(products: &[Matrix], n: usize) -> Matrix {
    assert_eq!(products.len(), NUM_TASKS, "expected seven sub-products");
    let [m1, m2, m3, m4, m5, m6, m7] = products else {
        unreachable!()
    };

    let c11 = ops::add(&ops::subtract(&ops::add(m1, m4), m5), m7);
    let c12 = ops::add(m3, m5);
    let c21 = ops::add(m2, m4);
    let c22 = ops::add(&ops::subtract(&ops::add(m1, m3), m2), m6);

    let half = n / 2;
    let mut c = Matrix::zeros(n);
    ops::join(&mut c, &c11, 0, 0);
    ops::join(&mut c, &c12, 0, half);
    ops::join(&mut c, &c21, half, 0);
    ops::join(&mut c, &c22, half, half);
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::quadrants;

    #[test]
    fn one_level_of_tasks_reproduces_the_direct_product() {
        let a = Matrix::random(8);
        let b = Matrix::random(8);
        let aq = quadrants(&a);
        let bq = quadrants(&b);

        let products: Vec<Matrix> = (1..=NUM_TASKS)
            .map(|task| {
                let (left, right) = operands(task, &aq, &bq);
                ops::multiply(&left, &right)
            })
            .collect();

        assert_eq!(assemble(&products, 8), ops::multiply(&a, &b));
    }

    #[test]
    fn operand_table_for_task_two() {
        let a = Matrix::random(4);
        let b = Matrix::random(4);
        let aq = quadrants(&a);
        let bq = quadrants(&b);
        let (left, right) = operands(2, &aq, &bq);
        assert_eq!(left, ops::add(&aq.q21, &aq.q22));
        assert_eq!(right, bq.q11);
    }

    #[test]
    #[should_panic(expected = "invalid Strassen task")]
    fn task_zero_is_rejected() {
        let q = quadrants(&Matrix::zeros(2));
        let _ = operands(0, &q, &q);
    }
}

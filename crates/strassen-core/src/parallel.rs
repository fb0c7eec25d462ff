//! Fork-join parallel Strassen engine.
//!
//! Same recursion as the sequential engine, restructured as a task
//! tree over the rayon thread pool and bounded by a memory-derived
//! maximum depth. Below the depth bound the tree hands off to the
//! sequential engine; under memory pressure it falls back to the
//! direct product. Each subtask owns freshly extracted quadrants, so
//! sibling tasks share no mutable state and never need a lock.

use tracing::{debug, warn};

use crate::matrix::Matrix;
use crate::memory::MemoryBudget;
use crate::ops;
use crate::sequential::SequentialEngine;
use crate::tasks::{self, NUM_TASKS};

/// Shared-memory fork-join Strassen engine.
#[derive(Clone)]
pub struct ParallelEngine {
    budget: MemoryBudget,
    sequential: SequentialEngine,
}

impl ParallelEngine {
    #[must_use]
    pub fn new(budget: MemoryBudget) -> Self {
        let sequential = SequentialEngine::new(budget.clone());
        Self { budget, sequential }
    }

    /// Multiply two equally sized square matrices.
    #[must_use]
    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        let n = a.size();
        assert_eq!(n, b.size(), "operand dimensions must match");

        if !self.budget.may_recurse_parallel(n) {
            warn!(
                size = n,
                "insufficient memory for fork-join Strassen; falling back to direct multiply"
            );
            return ops::multiply(a, b);
        }

        let max_depth = self.budget.max_parallel_depth(n);
        debug!(size = n, max_depth, "adaptive max recursion depth");
        self.task(a, b, 0, max_depth)
    }

    fn task(&self, a: &Matrix, b: &Matrix, depth: usize, max_depth: usize) -> Matrix {
        let n = a.size();

        if n <= 1 || n % 2 != 0 {
            return ops::multiply(a, b);
        }
        if !self.budget.may_recurse_parallel(n) {
            warn!(size = n, depth, "memory pressure; using direct multiply");
            return ops::multiply(a, b);
        }
        // Further fan-out is not worth the overhead at this depth;
        // switch to plain recursion on the current thread.
        if depth >= max_depth {
            return self.sequential.multiply(a, b);
        }

        let aq = ops::quadrants(a);
        let bq = ops::quadrants(b);
        let pairs: Vec<(Matrix, Matrix)> = (1..=NUM_TASKS)
            .map(|task| tasks::operands(task, &aq, &bq))
            .collect();

        // Fork six subtasks and compute the seventh inline, so the
        // current thread never idles waiting on work it could do.
        let mut products: Vec<Option<Matrix>> = vec![None; NUM_TASKS];
        rayon::scope(|s| {
            let (inline_slot, forked) = products
                .split_last_mut()
                .expect("seven product slots are always allocated");
            for (slot, (left, right)) in forked.iter_mut().zip(&pairs) {
                s.spawn(move |_| {
                    *slot = Some(self.task(left, right, depth + 1, max_depth));
                });
            }
            let (left, right) = &pairs[NUM_TASKS - 1];
            *inline_slot = Some(self.task(left, right, depth + 1, max_depth));
        });

        let products: Vec<Matrix> = products
            .into_iter()
            .map(|p| p.expect("scope joins every forked subtask"))
            .collect();
        tasks::assemble(&products, n)
    }
}

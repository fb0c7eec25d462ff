//! The tag-arithmetic wire contract between coordinator and workers.
//!
//! Tags are semantic and must stay bit-exact for interop:
//!
//! - `50`: single-int task count, coordinator -> worker.
//! - `200 + worker*10 + local`: single-int task id.
//! - `1000 + worker*100 + local*10 + part` (part 0..=3): flattened
//!   n/2 x n/2 operand buffer; unused slots travel as zero-filled
//!   buffers so the message count stays uniform across tasks.
//! - `3000 + task`: flattened n/2 x n/2 product, worker -> coordinator.
//!
//! `worker` is the worker's rank (1-based), `local` the worker-local
//! task index in dispatch order.

use strassen_core::matrix::Matrix;
use strassen_core::ops::{self, Quadrants};
use strassen_core::tasks::NUM_TASKS;
use strassen_core::SequentialEngine;

use crate::comm::Tag;

/// Tag of the task-count message.
pub const TASK_COUNT_TAG: Tag = 50;

const TASK_ID_BASE: Tag = 200;
const PART_BASE: Tag = 1000;
const RESULT_BASE: Tag = 3000;

/// Tag of the task-id message for `local` on `worker`.
#[must_use]
pub fn task_id_tag(worker: usize, local: usize) -> Tag {
    TASK_ID_BASE + (worker * 10 + local) as Tag
}

/// Tag of operand part `part` (0..=3) of task `local` on `worker`.
#[must_use]
pub fn part_tag(worker: usize, local: usize, part: usize) -> Tag {
    PART_BASE + (worker * 100 + local * 10 + part) as Tag
}

/// Tag of the result message for `task`.
#[must_use]
pub fn result_tag(task: usize) -> Tag {
    RESULT_BASE + task as Tag
}

/// Does `tag` label a task-id message?
#[must_use]
pub fn is_task_id_tag(tag: Tag) -> bool {
    (TASK_ID_BASE..PART_BASE).contains(&tag)
}

/// Recover the worker-local task index from a task-id tag. Inverse of
/// [`task_id_tag`].
#[must_use]
pub fn local_index(tag: Tag, worker: usize) -> usize {
    (tag - TASK_ID_BASE) as usize - worker * 10
}

/// Mapping of task id (1..=7) to worker rank (1-based).
///
/// With at least seven workers each task gets its own worker; with
/// fewer, tasks wrap round-robin.
#[derive(Debug, Clone)]
pub struct TaskAssignment {
    workers: usize,
}

impl TaskAssignment {
    /// # Panics
    /// Panics if `workers` is zero.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "task assignment needs at least one worker");
        Self { workers }
    }

    /// Worker rank assigned to `task` (1..=7).
    #[must_use]
    pub fn worker_for(&self, task: usize) -> usize {
        if self.workers >= NUM_TASKS {
            task
        } else {
            (task - 1) % self.workers + 1
        }
    }

    /// Tasks assigned to `worker`, in task order.
    #[must_use]
    pub fn tasks_for(&self, worker: usize) -> Vec<usize> {
        (1..=NUM_TASKS)
            .filter(|&task| self.worker_for(task) == worker)
            .collect()
    }
}

/// The four operand-quadrant slots of `task`, in wire order.
///
/// `None` slots carry no data for this task and are sent zero-filled.
#[must_use]
pub fn operand_parts<'q>(
    task: usize,
    a: &'q Quadrants,
    b: &'q Quadrants,
) -> [Option<&'q Matrix>; 4] {
    match task {
        1 => [Some(&a.q11), Some(&a.q22), Some(&b.q11), Some(&b.q22)],
        2 => [Some(&a.q21), Some(&a.q22), Some(&b.q11), None],
        3 => [Some(&a.q11), None, Some(&b.q12), Some(&b.q22)],
        4 => [Some(&a.q22), None, Some(&b.q21), Some(&b.q11)],
        5 => [Some(&a.q11), Some(&a.q12), Some(&b.q22), None],
        6 => [Some(&a.q21), Some(&a.q11), Some(&b.q11), Some(&b.q12)],
        7 => [Some(&a.q12), Some(&a.q22), Some(&b.q21), Some(&b.q22)],
        _ => panic!("invalid Strassen task: {task}"),
    }
}

/// Compute the single product of `task` from its four received operand
/// parts, using the sequential engine for the multiplication itself.
#[must_use]
pub fn compute_task(task: usize, parts: &[Matrix; 4], engine: &SequentialEngine) -> Matrix {
    let (left, right) = match task {
        1 => (
            ops::add(&parts[0], &parts[1]),
            ops::add(&parts[2], &parts[3]),
        ),
        2 | 5 => (ops::add(&parts[0], &parts[1]), parts[2].clone()),
        3 | 4 => (parts[0].clone(), ops::subtract(&parts[2], &parts[3])),
        6 | 7 => (
            ops::subtract(&parts[0], &parts[1]),
            ops::add(&parts[2], &parts[3]),
        ),
        _ => panic!("invalid Strassen task: {task}"),
    };
    engine.multiply(&left, &right)
}

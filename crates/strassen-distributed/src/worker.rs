//! Worker side of the distributed protocol.

use std::collections::HashSet;

use tracing::{debug, warn};

use strassen_core::codec;
use strassen_core::memory::MemoryBudget;
use strassen_core::SequentialEngine;

use crate::comm::{CommError, Communicator};
use crate::protocol::{self, TASK_COUNT_TAG};
use crate::DistributedError;

/// Consecutive unexpected messages tolerated before the worker gives
/// up on a desynchronized coordinator.
const MAX_UNEXPECTED: usize = 32;

/// Run one worker rank to completion.
///
/// Receives the broadcast size, the task count, then loops probing for
/// task-id messages until every assigned task has been computed and
/// its product sent back. Tasks can arrive in any order; the tag
/// arithmetic, not arrival order, identifies each task's operands.
///
/// # Errors
/// Surfaces transport failures, and fails with
/// [`CommError::Protocol`] after a bounded run of unexpected tags
/// rather than scanning forever.
pub fn run_worker<C: Communicator>(
    comm: &C,
    budget: &MemoryBudget,
    engine: &SequentialEngine,
) -> Result<(), DistributedError> {
    let rank = comm.rank();
    assert_ne!(rank, 0, "rank 0 is the coordinator");

    let n = comm.broadcast(0, 0)? as usize;
    let half = n / 2;

    // Warn-only, matching the coordinator: the wire protocol has no
    // refusal reply, so a starved worker proceeds and may thrash.
    if !budget.may_accept_task(half) {
        warn!(rank, size = half, "worker memory check failed for submatrix size");
    }

    let task_count = single_int(&comm.recv(0, TASK_COUNT_TAG)?)? as usize;
    debug!(rank, task_count, "worker ready");

    let mut completed: HashSet<usize> = HashSet::new();
    let mut unexpected = 0usize;

    while completed.len() < task_count {
        let tag = comm.probe(0)?;

        if !protocol::is_task_id_tag(tag) {
            // Drain it so the probe does not spin on the same message.
            let _ = comm.recv(0, tag)?;
            unexpected += 1;
            warn!(rank, tag, "unexpected tag");
            if unexpected >= MAX_UNEXPECTED {
                return Err(CommError::Protocol(format!(
                    "worker {rank} saw {unexpected} consecutive unexpected tags"
                ))
                .into());
            }
            continue;
        }
        unexpected = 0;

        let task = single_int(&comm.recv(0, tag)?)? as usize;
        let local = protocol::local_index(tag, rank);

        let mut parts = Vec::with_capacity(4);
        for part in 0..4 {
            let flat = comm.recv(0, protocol::part_tag(rank, local, part))?;
            parts.push(codec::unflatten(flat, half)?);
        }
        let parts: [_; 4] = parts.try_into().expect("exactly four operand parts");

        let product = protocol::compute_task(task, &parts, engine);
        comm.send(0, protocol::result_tag(task), codec::flatten(&product))?;
        completed.insert(task);
        debug!(rank, task, "task complete");
    }

    Ok(())
}

fn single_int(payload: &[i32]) -> Result<i32, CommError> {
    payload
        .first()
        .copied()
        .ok_or_else(|| CommError::Protocol("expected a single-int payload".into()))
}

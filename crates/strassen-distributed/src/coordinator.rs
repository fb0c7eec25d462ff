//! Coordinator (rank 0) side of the distributed protocol.

use tracing::{debug, warn};

use strassen_core::matrix::Matrix;
use strassen_core::memory::MemoryBudget;
use strassen_core::tasks::{self, NUM_TASKS};
use strassen_core::{codec, ops};

use crate::comm::Communicator;
use crate::protocol::{self, TaskAssignment, TASK_COUNT_TAG};
use crate::DistributedError;

/// Multiply `a` by `b` by distributing the seven Strassen sub-products
/// to worker ranks.
///
/// Performs exactly one level of decomposition: the quadrant operands
/// of each task are shipped to its assigned worker, the seven products
/// are collected back indexed by task id (results may arrive in any
/// order), and the output quadrants are recombined locally.
///
/// Must be called on rank 0 with every other rank inside
/// [`crate::run_worker`].
///
/// # Errors
/// Rejects odd sizes and empty worker sets before any traffic, and
/// surfaces transport failures (a lost worker aborts the run instead
/// of hanging it).
pub fn distributed_multiply<C: Communicator>(
    comm: &C,
    budget: &MemoryBudget,
    a: &Matrix,
    b: &Matrix,
) -> Result<Matrix, DistributedError> {
    assert_eq!(comm.rank(), 0, "distributed_multiply runs on rank 0");
    let n = a.size();
    assert_eq!(n, b.size(), "operand dimensions must match");

    if n % 2 != 0 {
        return Err(DistributedError::OddDimension(n));
    }
    let workers = comm.size().saturating_sub(1);
    if workers == 0 {
        return Err(DistributedError::NoWorkers);
    }

    // Everyone must agree on the submatrix dimensions first.
    comm.broadcast(0, n as i32)?;

    if !budget.may_accept_task(n) {
        warn!(
            size = n,
            "coordinator may have insufficient memory; consider smaller sizes or more processes"
        );
    }

    let half = n / 2;
    let aq = ops::quadrants(a);
    let bq = ops::quadrants(b);
    let assignment = TaskAssignment::new(workers);
    debug!(workers, size = n, "dispatching Strassen tasks");

    // Task counts, then per-task id + operand messages. Channel sends
    // are non-blocking; nothing here waits on worker-side processing.
    for worker in 1..=workers {
        let count = assignment.tasks_for(worker).len();
        comm.send(worker, TASK_COUNT_TAG, vec![count as i32])?;
    }
    for worker in 1..=workers {
        for (local, task) in assignment.tasks_for(worker).into_iter().enumerate() {
            let id_tag = protocol::task_id_tag(worker, local);
            comm.send(worker, id_tag, vec![task as i32])?;
            let parts = protocol::operand_parts(task, &aq, &bq);
            for (part, quadrant) in parts.into_iter().enumerate() {
                let flat = quadrant.map_or_else(|| vec![0; half * half], codec::flatten);
                comm.send(worker, protocol::part_tag(worker, local, part), flat)?;
            }
        }
    }

    // Collect one result per task id. Storage is indexed by task id,
    // not arrival order; the blocking receives form the barrier before
    // recombination.
    let mut products = Vec::with_capacity(NUM_TASKS);
    for task in 1..=NUM_TASKS {
        let worker = assignment.worker_for(task);
        let flat = comm.recv(worker, protocol::result_tag(task))?;
        products.push(codec::unflatten(flat, half)?);
        debug!(task, worker, "collected sub-product");
    }

    Ok(tasks::assemble(&products, n))
}

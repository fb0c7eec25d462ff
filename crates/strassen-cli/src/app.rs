//! Driver: generate matrices, run the selected engine, report timing.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::info;

use strassen_core::memory::{MemoryBudget, SystemProbe};
use strassen_core::{ops, Matrix, ParallelEngine, SequentialEngine};
use strassen_distributed::{distributed_multiply, run_worker, ChannelCommunicator};

use crate::config::{AppConfig, Mode};

/// Run the driver with the given configuration.
pub fn run(config: &AppConfig) -> Result<()> {
    if config.size == 0 {
        bail!("matrix size must be positive");
    }
    if config.mode == Mode::Distributed && config.size % 2 != 0 {
        bail!(
            "matrix size {} is odd; the distributed engine needs an even split",
            config.size
        );
    }

    let budget = MemoryBudget::new(Arc::new(SystemProbe::new()))
        .with_threshold(config.memory_threshold)
        .with_min_free_bytes(config.min_free_mb * 1024 * 1024);

    let a = Matrix::random(config.size);
    let b = Matrix::random(config.size);

    let runs = config.runs.max(1);
    let mut total = Duration::ZERO;
    let mut result = None;
    for _ in 0..runs {
        let start = Instant::now();
        let c = multiply_once(config, &budget, &a, &b)?;
        total += start.elapsed();
        result = Some(c);
    }
    let result = result.expect("at least one run");
    let average = total / runs;

    println!(
        "{:?} multiply of {n}x{n} matrices: {average:?} (average over {runs} runs)",
        config.mode,
        n = config.size,
    );

    if config.verify {
        info!("verifying against the direct product");
        if result == ops::multiply(&a, &b) {
            println!("verification passed");
        } else {
            bail!("result does not match the direct product");
        }
    }

    Ok(())
}

fn multiply_once(
    config: &AppConfig,
    budget: &MemoryBudget,
    a: &Matrix,
    b: &Matrix,
) -> Result<Matrix> {
    match config.mode {
        Mode::Sequential => Ok(SequentialEngine::new(budget.clone()).multiply(a, b)),
        Mode::Parallel => Ok(ParallelEngine::new(budget.clone()).multiply(a, b)),
        Mode::Distributed => distributed_run(config.workers, budget, a, b),
    }
}

/// Run the distributed engine over an in-process mesh, one thread per
/// rank, with the coordinator on the calling thread.
fn distributed_run(
    workers: usize,
    budget: &MemoryBudget,
    a: &Matrix,
    b: &Matrix,
) -> Result<Matrix> {
    if workers == 0 {
        bail!("distributed mode needs at least one worker");
    }

    let mut mesh = ChannelCommunicator::mesh(workers + 1);
    let coordinator_comm = mesh.remove(0);

    let handles: Vec<_> = mesh
        .into_iter()
        .map(|comm| {
            let budget = budget.clone();
            thread::spawn(move || {
                let engine = SequentialEngine::new(budget.clone());
                run_worker(&comm, &budget, &engine)
            })
        })
        .collect();

    let result = distributed_multiply(&coordinator_comm, budget, a, b);
    drop(coordinator_comm);

    for (rank, handle) in handles.into_iter().enumerate() {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker {} panicked", rank + 1))?
            .with_context(|| format!("worker {} failed", rank + 1))?;
    }

    result.context("distributed multiply failed")
}

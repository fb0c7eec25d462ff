//! # strassen-distributed
//!
//! Multi-process-style Strassen multiplication over a message-passing
//! communicator. A coordinator (rank 0) performs exactly one level of
//! decomposition, ships the seven canonical sub-products to worker
//! ranks as independent tasks, and recombines the returned products.
//! Workers compute their assigned tasks with the sequential engine.
//!
//! The tag-arithmetic wire protocol in [`protocol`] is a deliberate
//! contract and is reproduced bit-exact; see that module's docs.

pub mod comm;
pub mod coordinator;
pub mod protocol;
pub mod worker;

// Re-exports
pub use comm::{ChannelCommunicator, CommError, Communicator};
pub use coordinator::distributed_multiply;
pub use protocol::TaskAssignment;
pub use worker::run_worker;

use strassen_core::EngineError;

/// Error type for a distributed run.
#[derive(Debug, thiserror::Error)]
pub enum DistributedError {
    /// Usage error: odd sizes cannot be split into quadrants. Rejected
    /// before any matrix traffic.
    #[error("matrix size {0} is odd; Strassen decomposition requires an even split")]
    OddDimension(usize),

    /// The communicator has no worker ranks to dispatch to.
    #[error("distributed run requires at least one worker rank")]
    NoWorkers,

    /// Transport-level failure (lost peer, desynchronized protocol).
    #[error(transparent)]
    Comm(#[from] CommError),

    /// A wire buffer failed shape validation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

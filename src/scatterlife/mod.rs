//! ScatterLife engine: neighbor counts by an eight-way shifted-view
//! reduce-scatter over a fixed group of workers.

pub mod collective;
mod engine;
pub mod gather;
#[cfg(feature = "mpi")]
pub mod mpi;
pub mod neighbors;
pub mod offsets;
pub mod rules;
mod sync;

pub use collective::{Communicator, ThreadComm, ThreadGroup};
pub use engine::{
    DEFAULT_GENERATIONS, DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH, Phase, RunReport,
    ScatterLife, ScatterLifeConfig, generation_step, validate_dimensions,
};
pub use offsets::{Direction, OffsetTable, WORKER_COUNT};

//! Error types for ScatterLife.

use thiserror::Error;

use crate::scatterlife::Phase;

/// Errors raised while configuring or running a simulation.
///
/// Every variant is fatal for the run it occurs in: a failed collective
/// leaves no worker with a usable partial result.
#[derive(Error, Debug)]
pub enum LifeError {
    #[error("invalid grid dimensions {width}x{height}: {reason}")]
    Dimensions {
        width: usize,
        height: usize,
        reason: &'static str,
    },

    #[error("worker count mismatch: group has {actual} workers, the neighbor table binds {expected}")]
    WorkerCount { expected: usize, actual: usize },

    #[error("buffer length mismatch in collective: expected {expected}, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    /// Another member of the group aborted; this worker was released early.
    #[error("worker group aborted")]
    Aborted,

    #[error("worker {rank} panicked: {message}")]
    WorkerPanicked { rank: usize, message: String },

    #[error("generation {generation} failed while {phase}: {source}")]
    Collective {
        generation: u64,
        phase: Phase,
        #[source]
        source: Box<LifeError>,
    },

    #[error("snapshot for generation {generation} failed: {source}")]
    Snapshot {
        generation: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot prepare snapshot directory {}: {source}", .path.display())]
    DumpDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type LifeResult<T> = Result<T, LifeError>;

impl LifeError {
    /// Attach the generation and phase a collective failure happened in.
    pub fn during(self, generation: u64, phase: Phase) -> Self {
        match self {
            // Already attributed, or not a collective failure at all.
            err @ (LifeError::Collective { .. }
            | LifeError::Snapshot { .. }
            | LifeError::DumpDir { .. }) => err,
            other => LifeError::Collective {
                generation,
                phase,
                source: Box::new(other),
            },
        }
    }

    /// True when this error only reflects another member's failure.
    pub fn is_secondary(&self) -> bool {
        match self {
            LifeError::Aborted => true,
            LifeError::Collective { source, .. } => source.is_secondary(),
            _ => false,
        }
    }
}

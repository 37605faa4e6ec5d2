//! Multi-process worker group over MPI.
//!
//! `MpiComm` maps the three collectives onto their MPI counterparts, one
//! process per rank. MPI's default error handler terminates the job on a
//! failed call, so the only errors returned here are local length checks;
//! `abort` tears down the whole job.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ::mpi::collective::SystemOperation;
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::{Communicator as _, CommunicatorCollectives, Root};

use super::collective::{Communicator, partition};
use super::engine::{RunReport, ScatterLifeConfig, SharedSink, run_worker};
use super::neighbors::{COORDINATOR, check_group, chunk_len};
use super::offsets::OffsetTable;
use crate::error::{LifeError, LifeResult};
use crate::grid::PaddedGrid;
use crate::snapshot::SnapshotSink;

/// Exit code handed to `MPI_Abort`.
const ABORT_CODE: i32 = 1;

pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &SimpleCommunicator {
        &self.world
    }

    fn check_len(expected: usize, actual: usize) -> LifeResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(LifeError::BufferLength { expected, actual })
        }
    }
}

impl Communicator for MpiComm {
    #[inline]
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    #[inline]
    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn broadcast(&self, buf: &mut [u8], root: usize) -> LifeResult<()> {
        tracing::trace!(rank = self.rank(), root, len = buf.len(), "broadcast");
        self.world.process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    fn reduce_scatter_sum(&self, contribution: &[u8], chunk: &mut [u8]) -> LifeResult<()> {
        tracing::trace!(rank = self.rank(), len = contribution.len(), "reduce_scatter_sum");
        let Some(ranges) = partition(contribution.len(), self.size()) else {
            return Err(LifeError::BufferLength {
                expected: contribution.len().next_multiple_of(self.size()),
                actual: contribution.len(),
            });
        };
        Self::check_len(ranges[self.rank()].len(), chunk.len())?;
        self.world
            .reduce_scatter_block_into(contribution, chunk, SystemOperation::sum());
        Ok(())
    }

    fn gather(&self, chunk: &[u8], dest: Option<&mut [u8]>, root: usize) -> LifeResult<()> {
        tracing::trace!(rank = self.rank(), root, len = chunk.len(), "gather");
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() != root {
            root_process.gather_into(chunk);
            return Ok(());
        }
        let Some(dest) = dest else {
            return Err(LifeError::BufferLength {
                expected: chunk.len() * self.size(),
                actual: 0,
            });
        };
        Self::check_len(chunk.len() * self.size(), dest.len())?;
        root_process.gather_into_root(chunk, dest);
        Ok(())
    }

    fn abort(&self) {
        tracing::error!(rank = self.rank(), "aborting MPI job");
        self.world.abort(ABORT_CODE)
    }
}

/// Run `n` generations with this process as one rank of `comm`.
///
/// Every rank calls this with the same `config`. The coordinator seeds the
/// grid and hands each gathered generation to `sink`; the other ranks start
/// from an empty replica that the first broadcast overwrites. Returns the
/// coordinator's report, or `None` on the other ranks.
///
/// A world whose size is not the offset table's length is rejected before
/// any collective runs, on every rank alike. Any later failure is returned
/// unchanged; the caller is expected to `abort` so no rank stays blocked.
pub fn run_world(
    comm: &MpiComm,
    config: &ScatterLifeConfig,
    n: u64,
    sink: Option<&mut (dyn SnapshotSink + Send)>,
) -> LifeResult<Option<RunReport>> {
    config.validate()?;
    let offsets = OffsetTable::build(config.width);
    check_group(comm, &offsets)?;

    let mut replica = if comm.rank() == COORDINATOR {
        PaddedGrid::initialize(config.width, config.height, config.seed)
    } else {
        PaddedGrid::new(config.width, config.height)
    };
    let mut counts = Vec::with_capacity(chunk_len(&replica));
    let sink: SharedSink<'_> = Mutex::new(sink);
    let completed = AtomicU64::new(0);

    let start = Instant::now();
    run_worker(comm, &offsets, &mut replica, &mut counts, 0..n, &sink, &completed)?;
    let elapsed = start.elapsed();

    Ok((comm.rank() == COORDINATOR).then(|| RunReport {
        generations: completed.load(Ordering::Relaxed),
        elapsed,
        population: replica.population(),
    }))
}

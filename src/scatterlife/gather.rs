//! Reassembly of updated chunks on the coordinator.

use super::collective::Communicator;
use super::neighbors::COORDINATOR;
use crate::error::LifeResult;
use crate::grid::PaddedGrid;

/// Collect every worker's updated chunk into the coordinator's grid.
///
/// Chunk `i` lands on the `i`-th row range of the interior; border rows are
/// not touched. Only the coordinator's `replica` is written. No worker may
/// read the grid again until this returns.
pub fn gather_chunks<C: Communicator>(
    comm: &C,
    chunk: &[u8],
    replica: &mut PaddedGrid,
) -> LifeResult<()> {
    let dest = (comm.rank() == COORDINATOR).then(|| replica.interior_mut());
    comm.gather(chunk, dest, COORDINATOR)
}

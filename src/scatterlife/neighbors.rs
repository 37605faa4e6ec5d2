//! Neighbor counting by shifted-view reduction.
//!
//! Every worker holds the same replica of the grid. Worker `i` contributes
//! the replica viewed through `offset[i]`, so at position `k` its
//! contribution is the state of `k`'s neighbor in direction `i`. Summing the
//! eight contributions gives the live-neighbor count at every position of
//! padded rows `1..=height`; the reduce-scatter hands each worker the
//! `height / 8` rows it owns.
//!
//! Positions on the left and right border columns pick up reads that wrap
//! into the neighboring row, so their sums are meaningless and are cleared
//! before anything looks at them.

use super::collective::{Communicator, sum_into};
use super::offsets::{OffsetTable, WORKER_COUNT};
use crate::error::{LifeError, LifeResult};
use crate::grid::PaddedGrid;

/// Rank holding the authoritative grid between generations.
pub const COORDINATOR: usize = 0;

/// Length of each worker's count chunk for a grid of this shape.
#[inline]
pub fn chunk_len(grid: &PaddedGrid) -> usize {
    grid.interior_span() / WORKER_COUNT
}

/// Interior rows owned by `rank`.
#[inline]
pub fn chunk_rows(grid: &PaddedGrid, rank: usize) -> std::ops::Range<usize> {
    let rows = grid.height() / WORKER_COUNT;
    rank * rows..(rank + 1) * rows
}

/// Check the group against the offset table before any generation runs.
pub fn check_group<C: Communicator>(comm: &C, offsets: &OffsetTable) -> LifeResult<()> {
    if comm.size() != offsets.len() {
        return Err(LifeError::WorkerCount {
            expected: offsets.len(),
            actual: comm.size(),
        });
    }
    Ok(())
}

/// Zero the counts that fall on border columns.
///
/// `counts` must start at a row boundary and cover whole padded rows.
pub fn correct_border(counts: &mut [u8], stride: usize) {
    debug_assert_eq!(counts.len() % stride, 0);
    for row in counts.chunks_exact_mut(stride) {
        row[0] = 0;
        row[stride - 1] = 0;
    }
}

/// Replicate the coordinator's grid into `replica` on every worker.
pub fn broadcast_grid<C: Communicator>(comm: &C, replica: &mut PaddedGrid) -> LifeResult<()> {
    comm.broadcast(replica.raw_mut(), COORDINATOR)
}

/// Sum the eight shifted views of `replica` and deliver this worker's rows.
///
/// `replica` must already hold the broadcast grid. On return `counts` holds
/// the neighbor count of every cell in `chunk_rows(replica, rank)`, border
/// columns zeroed.
pub fn reduce_counts<C: Communicator>(
    comm: &C,
    replica: &PaddedGrid,
    offsets: &OffsetTable,
    counts: &mut [u8],
) -> LifeResult<()> {
    debug_assert_eq!(offsets.width(), replica.width());
    let view = replica.shifted_view(offsets.get(comm.rank()));
    comm.reduce_scatter_sum(view, counts)?;
    correct_border(counts, replica.stride());
    Ok(())
}

/// Broadcast, then reduce: the full neighbor-count step for one worker.
pub fn count_neighbors<C: Communicator>(
    comm: &C,
    replica: &mut PaddedGrid,
    offsets: &OffsetTable,
    counts: &mut [u8],
) -> LifeResult<()> {
    broadcast_grid(comm, replica)?;
    reduce_counts(comm, replica, offsets, counts)
}

/// Neighbor counts for padded rows `1..=height` computed in one address
/// space: the same eight views, summed sequentially.
pub fn count_all(grid: &PaddedGrid, offsets: &OffsetTable) -> Vec<u8> {
    let mut counts = vec![0u8; grid.interior_span()];
    for &offset in offsets.as_array() {
        sum_into(&mut counts, grid.shifted_view(offset));
    }
    correct_border(&mut counts, grid.stride());
    counts
}

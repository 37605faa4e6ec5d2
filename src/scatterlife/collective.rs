//! Collective operations for the worker group.
//!
//! `Communicator` is the seam between the generation logic and whatever
//! moves bytes between workers. `ThreadGroup` is the in-process
//! implementation: each member deposits into its own slot, meets the others
//! at a `GroupBarrier`, then reads whatever slots the operation needs.
//!
//! The reduce-scatter is built from two pieces, `sum_into` and `partition`,
//! so each can be checked on its own.

use std::ops::Range;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::sync::GroupBarrier;
use crate::error::{LifeError, LifeResult};

/// A member's handle on the group. Every method except `abort` is a
/// blocking collective that all members must call in the same order.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Copy `root`'s `buf` into every other member's `buf`.
    fn broadcast(&self, buf: &mut [u8], root: usize) -> LifeResult<()>;

    /// Sum all members' `contribution`s elementwise, split the result into
    /// `size()` equal contiguous ranges, and write range `rank()` to `chunk`.
    fn reduce_scatter_sum(&self, contribution: &[u8], chunk: &mut [u8]) -> LifeResult<()>;

    /// Concatenate every member's `chunk`, in rank order, into `dest` on
    /// `root`. `dest` is ignored on the other members.
    fn gather(&self, chunk: &[u8], dest: Option<&mut [u8]>, root: usize) -> LifeResult<()>;

    /// Fail the group: every pending and future collective returns `Aborted`.
    fn abort(&self);
}

/// Elementwise `acc[i] += src[i]`.
///
/// Counts never exceed the group size, so `u8` cannot overflow for the
/// 8-member group; wrapping keeps the arithmetic total anyway.
#[inline]
pub fn sum_into(acc: &mut [u8], src: &[u8]) {
    assert_eq!(acc.len(), src.len(), "sum_into length mismatch");
    for (a, &s) in acc.iter_mut().zip(src) {
        *a = a.wrapping_add(s);
    }
}

/// Split `0..len` into `parts` equal contiguous ranges in order.
///
/// Returns `None` when `len` does not divide evenly.
pub fn partition(len: usize, parts: usize) -> Option<Vec<Range<usize>>> {
    if parts == 0 || len % parts != 0 {
        return None;
    }
    let size = len / parts;
    Some((0..parts).map(|i| i * size..(i + 1) * size).collect())
}

/// Shared state of an in-process worker group.
#[derive(Debug)]
pub struct ThreadGroup {
    barrier: GroupBarrier,
    slots: Vec<RwLock<Vec<u8>>>,
}

impl ThreadGroup {
    pub fn new(size: usize) -> Self {
        Self {
            barrier: GroupBarrier::new(size),
            slots: (0..size).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.barrier.size()
    }

    /// Handle for member `rank`. Each rank must be driven by exactly one
    /// thread at a time.
    pub fn communicator(&self, rank: usize) -> ThreadComm<'_> {
        assert!(rank < self.size(), "rank {rank} outside group of {}", self.size());
        ThreadComm { group: self, rank }
    }

    pub fn is_aborted(&self) -> bool {
        self.barrier.is_aborted()
    }

    // Slot contents are plain bytes, so a poisoned lock is still readable;
    // the panicking member has already aborted the group.
    fn read_slot(&self, rank: usize) -> RwLockReadGuard<'_, Vec<u8>> {
        self.slots[rank].read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self, rank: usize) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.slots[rank].write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadComm<'g> {
    group: &'g ThreadGroup,
    rank: usize,
}

impl ThreadComm<'_> {
    fn deposit(&self, data: &[u8]) {
        let mut slot = self.group.write_slot(self.rank);
        slot.clear();
        slot.extend_from_slice(data);
    }

    fn check_len(expected: usize, actual: usize) -> LifeResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(LifeError::BufferLength { expected, actual })
        }
    }

    /// Abort the group on a local failure so nobody waits for this member.
    fn fail<T>(&self, err: LifeError) -> LifeResult<T> {
        self.abort();
        Err(err)
    }
}

impl Communicator for ThreadComm<'_> {
    #[inline]
    fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    fn size(&self) -> usize {
        self.group.size()
    }

    fn broadcast(&self, buf: &mut [u8], root: usize) -> LifeResult<()> {
        tracing::trace!(rank = self.rank, root, len = buf.len(), "broadcast");
        if self.rank == root {
            self.deposit(buf);
        }
        self.group.barrier.wait()?;
        if self.rank != root {
            let src = self.group.read_slot(root);
            if let Err(err) = Self::check_len(buf.len(), src.len()) {
                drop(src);
                return self.fail(err);
            }
            buf.copy_from_slice(&src);
        }
        // Root may not overwrite its slot until every member has copied it.
        self.group.barrier.wait()
    }

    fn reduce_scatter_sum(&self, contribution: &[u8], chunk: &mut [u8]) -> LifeResult<()> {
        tracing::trace!(rank = self.rank, len = contribution.len(), "reduce_scatter_sum");
        let Some(ranges) = partition(contribution.len(), self.size()) else {
            return self.fail(LifeError::BufferLength {
                expected: contribution.len().next_multiple_of(self.size()),
                actual: contribution.len(),
            });
        };
        let mine = ranges[self.rank].clone();
        if let Err(err) = Self::check_len(mine.len(), chunk.len()) {
            return self.fail(err);
        }

        self.deposit(contribution);
        self.group.barrier.wait()?;

        chunk.fill(0);
        for peer in 0..self.size() {
            let src = self.group.read_slot(peer);
            if let Err(err) = Self::check_len(contribution.len(), src.len()) {
                drop(src);
                return self.fail(err);
            }
            sum_into(chunk, &src[mine.clone()]);
        }
        self.group.barrier.wait()
    }

    fn gather(&self, chunk: &[u8], dest: Option<&mut [u8]>, root: usize) -> LifeResult<()> {
        tracing::trace!(rank = self.rank, root, len = chunk.len(), "gather");
        self.deposit(chunk);
        self.group.barrier.wait()?;

        if self.rank == root {
            let Some(dest) = dest else {
                return self.fail(LifeError::BufferLength {
                    expected: chunk.len() * self.size(),
                    actual: 0,
                });
            };
            let Some(ranges) = partition(dest.len(), self.size()) else {
                return self.fail(LifeError::BufferLength {
                    expected: chunk.len() * self.size(),
                    actual: dest.len(),
                });
            };
            for (peer, range) in ranges.into_iter().enumerate() {
                let src = self.group.read_slot(peer);
                if let Err(err) = Self::check_len(range.len(), src.len()) {
                    drop(src);
                    return self.fail(err);
                }
                dest[range].copy_from_slice(&src);
            }
        }
        self.group.barrier.wait()
    }

    fn abort(&self) {
        tracing::debug!(rank = self.rank, "aborting worker group");
        self.group.barrier.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn run_group<T, F>(size: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(ThreadComm<'_>) -> T + Sync,
    {
        let group = ThreadGroup::new(size);
        thread::scope(|s| {
            let handles: Vec<_> = (0..size)
                .map(|rank| {
                    let comm = group.communicator(rank);
                    let f = &f;
                    s.spawn(move || f(comm))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn sum_into_adds_elementwise() {
        let mut acc = vec![1u8, 0, 2];
        sum_into(&mut acc, &[0, 3, 1]);
        assert_eq!(acc, vec![1, 3, 3]);
    }

    #[test]
    fn partition_is_contiguous_and_disjoint() {
        let ranges = partition(80, 8).unwrap();
        assert_eq!(ranges.len(), 8);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[7].end, 80);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].len(), 10);
        }
        assert!(partition(81, 8).is_none());
        assert!(partition(8, 0).is_none());
    }

    #[test]
    fn broadcast_copies_root_buffer() {
        let out = run_group(4, |comm| {
            let mut buf = if comm.rank() == 2 { vec![7u8, 8, 9] } else { vec![0u8; 3] };
            comm.broadcast(&mut buf, 2).unwrap();
            buf
        });
        assert!(out.iter().all(|b| b == &[7, 8, 9]));
    }

    #[test]
    fn reduce_scatter_sums_then_splits() {
        let out = run_group(4, |comm| {
            // Member r contributes r+1 everywhere.
            let contribution = vec![comm.rank() as u8 + 1; 8];
            let mut chunk = vec![0u8; 2];
            comm.reduce_scatter_sum(&contribution, &mut chunk).unwrap();
            chunk
        });
        for chunk in out {
            assert_eq!(chunk, vec![10, 10]);
        }
    }

    #[test]
    fn reduce_scatter_keeps_positions() {
        let out = run_group(2, |comm| {
            let contribution: Vec<u8> = (0..4).map(|i| i * (comm.rank() as u8 + 1)).collect();
            let mut chunk = vec![0u8; 2];
            comm.reduce_scatter_sum(&contribution, &mut chunk).unwrap();
            chunk
        });
        // Column sums of [0,1,2,3] and [0,2,4,6].
        assert_eq!(out, vec![vec![0, 3], vec![6, 9]]);
    }

    #[test]
    fn gather_concatenates_in_rank_order() {
        let out = run_group(3, |comm| {
            let chunk = vec![comm.rank() as u8; 2];
            let mut dest = vec![0xFFu8; 6];
            let target = (comm.rank() == 0).then_some(dest.as_mut_slice());
            comm.gather(&chunk, target, 0).unwrap();
            dest
        });
        assert_eq!(out[0], vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(out[1], vec![0xFF; 6]);
    }

    #[test]
    fn mismatched_lengths_abort_the_group() {
        let out = run_group(2, |comm| {
            let mut buf = vec![0u8; if comm.rank() == 0 { 4 } else { 3 }];
            comm.broadcast(&mut buf, 0)
        });
        assert!(matches!(out[1], Err(LifeError::BufferLength { expected: 3, actual: 4 })));
        assert!(matches!(out[0], Err(LifeError::Aborted)));
    }

    #[test]
    fn abort_is_sticky_for_later_collectives() {
        let group = ThreadGroup::new(2);
        assert!(!group.is_aborted());
        group.communicator(1).abort();
        assert!(group.is_aborted());

        // A lone member would otherwise block forever at the barrier.
        let mut buf = vec![0u8; 4];
        let err = group.communicator(0).broadcast(&mut buf, 0).unwrap_err();
        assert!(matches!(err, LifeError::Aborted));
    }
}

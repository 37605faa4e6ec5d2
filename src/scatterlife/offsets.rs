//! Direction-to-displacement table binding each worker to one neighbor.
//!
//! Worker `i` reads the whole grid through a view displaced by `offset[i]`.
//! The eight displacements cover the Moore neighborhood exactly once, which
//! is what makes the group-wide sum a neighbor count. The group size is
//! therefore not a tuning knob: it must equal `Direction::ALL.len()`.

/// The 8 Moore-neighbor directions, in worker-rank order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    NW    = 0, // (x-1, y-1)
    North = 1, // (x,   y-1)
    NE    = 2, // (x+1, y-1)
    West  = 3, // (x-1, y)
    East  = 4, // (x+1, y)
    SW    = 5, // (x-1, y+1)
    South = 6, // (x,   y+1)
    SE    = 7, // (x+1, y+1)
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::NW,    Direction::North, Direction::NE,
        Direction::West,                    Direction::East,
        Direction::SW,    Direction::South, Direction::SE,
    ];

    /// `(dx, dy)` with `y` growing downwards, matching row-major storage.
    #[inline]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::NW    => (-1, -1),
            Direction::North => (0, -1),
            Direction::NE    => (1, -1),
            Direction::West  => (-1, 0),
            Direction::East  => (1, 0),
            Direction::SW    => (-1, 1),
            Direction::South => (0, 1),
            Direction::SE    => (1, 1),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Number of workers in a group. Fixed by the neighborhood, see module docs.
pub const WORKER_COUNT: usize = Direction::ALL.len();

/// Displacements of the eight shifted views inside a grid's raw buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetTable {
    width: usize,
    offsets: [usize; WORKER_COUNT],
}

impl OffsetTable {
    /// Derive the table for grids with interior width `width`.
    ///
    /// A view origin displaced by `(dy + 1) * stride + (dx + 1)` lines up
    /// element `k` of the view with the `(dx, dy)` neighbor of padded cell
    /// `stride + k`, given the single leading guard byte.
    pub fn build(width: usize) -> Self {
        let stride = width + 2;
        let offsets = Direction::ALL.map(|dir| {
            let (dx, dy) = dir.delta();
            (dy + 1) as usize * stride + (dx + 1) as usize
        });
        Self { width, offsets }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Displacement bound to worker `rank`.
    #[inline]
    pub fn get(&self, rank: usize) -> usize {
        self.offsets[rank]
    }

    #[inline]
    pub fn direction(&self, rank: usize) -> Direction {
        Direction::ALL[rank]
    }

    pub fn as_array(&self) -> &[usize; WORKER_COUNT] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_hardcoded_layout() {
        let w = 1024;
        let table = OffsetTable::build(w);
        assert_eq!(
            table.as_array(),
            &[0, 1, 2, w + 2, w + 4, 2 * w + 4, 2 * w + 5, 2 * w + 6]
        );
    }

    #[test]
    fn offsets_are_distinct_and_skip_the_center() {
        let table = OffsetTable::build(6);
        let stride = 8;
        let center = stride + 1;
        let mut seen = table.as_array().to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), WORKER_COUNT);
        assert!(!seen.contains(&center));
    }

    #[test]
    fn rank_binding_follows_direction_order() {
        let table = OffsetTable::build(4);
        for (rank, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(table.direction(rank), *dir);
            assert_eq!(dir.index(), rank);
        }
    }
}

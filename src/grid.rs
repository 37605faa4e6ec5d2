//! Padded cell buffer shared by both engines.
//!
//! Layout of the raw buffer, with `s = width + 2`:
//!
//! ```text
//! [guard] [row 0: s border cells] [row 1 .. row h: border, w cells, border] [row h+1: s border cells] [guard]
//! ```
//!
//! Padded cell `(row, col)` lives at raw index `GUARD + row * s + col`. The
//! border ring and both guard bytes are always dead. The guards exist so that
//! each of the eight shifted views over padded rows `1..=h` is an in-bounds
//! slice of the same buffer.

use std::ops::Range;

use rand::{Rng, SeedableRng};

/// Dead bytes before the first and after the last padded cell.
pub const GUARD: usize = 1;

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

pub const SNAPSHOT_ALIVE: char = 'x';
pub const SNAPSHOT_DEAD: char = 'o';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddedGrid {
    width: usize,
    height: usize,
    raw: Vec<u8>,
}

/// Length of the backing buffer for a `width x height` interior, guards
/// included. `None` when it does not fit in `usize`.
pub fn buffer_len(width: usize, height: usize) -> Option<usize> {
    let stride = width.checked_add(2)?;
    stride
        .checked_mul(height.checked_add(2)?)?
        .checked_add(2 * GUARD)
}

impl PaddedGrid {
    /// An all-dead grid with a `width x height` interior.
    ///
    /// Panics on an empty interior or a size that overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid interior must be non-empty");
        let Some(len) = buffer_len(width, height) else {
            panic!("grid {width}x{height} is too large to address");
        };
        Self {
            width,
            height,
            raw: vec![DEAD; len],
        }
    }

    /// Fill the interior with independent fair coin flips drawn from a
    /// generator seeded with `seed`. Same seed, same grid.
    pub fn initialize(width: usize, height: usize, seed: u64) -> Self {
        let mut grid = Self::new(width, height);
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for y in 0..height {
            let start = grid.raw_index(y + 1, 1);
            for cell in &mut grid.raw[start..start + width] {
                *cell = rng.random_bool(0.5) as u8;
            }
        }
        grid
    }

    /// Build a grid from interior coordinates of live cells.
    pub fn from_live_cells<I>(width: usize, height: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut grid = Self::new(width, height);
        for (x, y) in cells {
            grid.set(x, y, true);
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride of the padded layout.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width + 2
    }

    /// Number of elements covered by padded rows `1..=height`. This is the
    /// length of every shifted view and of the reduced count buffer.
    #[inline]
    pub fn interior_span(&self) -> usize {
        self.stride() * self.height
    }

    #[inline(always)]
    fn raw_index(&self, row: usize, col: usize) -> usize {
        GUARD + row * self.stride() + col
    }

    #[inline]
    fn check_cell(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "cell ({x},{y}) outside {}x{} interior",
            self.width,
            self.height
        );
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.check_cell(x, y);
        self.raw[self.raw_index(y + 1, x + 1)] != DEAD
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.check_cell(x, y);
        let idx = self.raw_index(y + 1, x + 1);
        self.raw[idx] = alive as u8;
    }

    /// All padded cells, border included, guards excluded.
    pub fn read(&self) -> &[u8] {
        &self.raw[GUARD..self.raw.len() - GUARD]
    }

    /// Padded cell value at padded coordinates (border rows/columns allowed).
    pub fn padded(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.height + 2 && col < self.stride());
        self.raw[self.raw_index(row, col)]
    }

    /// Full padded rows for the interior row range `rows`.
    pub fn rows(&self, rows: Range<usize>) -> &[u8] {
        let span = self.row_span(&rows);
        &self.raw[span]
    }

    /// Overwrite interior rows `rows` from full padded rows in `values`.
    ///
    /// Border columns in `values` are ignored; the border stays dead.
    pub fn write_rows(&mut self, rows: Range<usize>, values: &[u8]) {
        let stride = self.stride();
        let span = self.row_span(&rows);
        assert_eq!(values.len(), span.len(), "row data does not cover {rows:?}");
        for (dst, src) in self.raw[span]
            .chunks_exact_mut(stride)
            .zip(values.chunks_exact(stride))
        {
            dst[1..stride - 1].copy_from_slice(&src[1..stride - 1]);
        }
    }

    fn row_span(&self, rows: &Range<usize>) -> Range<usize> {
        assert!(
            rows.start <= rows.end && rows.end <= self.height,
            "row range {rows:?} outside interior of height {}",
            self.height
        );
        self.raw_index(rows.start + 1, 0)..self.raw_index(rows.end + 1, 0)
    }

    /// The buffer as seen by the worker bound to displacement `offset`:
    /// element `k` is the neighbor, in that worker's direction, of the cell
    /// at position `k` of padded rows `1..=height`.
    pub fn shifted_view(&self, offset: usize) -> &[u8] {
        &self.raw[offset..offset + self.interior_span()]
    }

    /// Padded rows `1..=height`, the destination of the gather.
    pub(crate) fn interior_mut(&mut self) -> &mut [u8] {
        let span = self.row_span(&(0..self.height));
        &mut self.raw[span]
    }

    /// Entire backing buffer, the payload of the broadcast.
    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.raw
    }

    pub fn population(&self) -> u64 {
        self.read().iter().map(|&c| c as u64).sum()
    }

    /// Visit live cells in row-major order with interior coordinates.
    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        let stride = self.stride();
        for (y, row) in self.rows(0..self.height).chunks_exact(stride).enumerate() {
            for (x, &cell) in row[1..stride - 1].iter().enumerate() {
                if cell != DEAD {
                    f(x, y);
                }
            }
        }
    }

    /// Snapshot text: one line per interior row, `'x'` alive, `'o'` dead.
    pub fn render(&self) -> String {
        let stride = self.stride();
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.rows(0..self.height).chunks_exact(stride) {
            out.extend(row[1..stride - 1].iter().map(|&cell| {
                if cell != DEAD {
                    SNAPSHOT_ALIVE
                } else {
                    SNAPSHOT_DEAD
                }
            }));
            out.push('\n');
        }
        out
    }

    /// True when the border ring and both guards are dead.
    pub fn border_is_dead(&self) -> bool {
        let stride = self.stride();
        let last_row = self.height + 1;
        let guards_dead = self.raw[0] == DEAD && self.raw[self.raw.len() - 1] == DEAD;
        let rows_dead = (0..stride)
            .all(|col| self.padded(0, col) == DEAD && self.padded(last_row, col) == DEAD);
        let cols_dead = (1..=self.height)
            .all(|row| self.padded(row, 0) == DEAD && self.padded(row, stride - 1) == DEAD);
        guards_dead && rows_dead && cols_dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_deterministic_and_keeps_border_dead() {
        let a = PaddedGrid::initialize(32, 16, 1_646_868);
        let b = PaddedGrid::initialize(32, 16, 1_646_868);
        let c = PaddedGrid::initialize(32, 16, 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.border_is_dead());
        // A fair coin over 512 cells lands far from both extremes.
        let pop = a.population();
        assert!(pop > 128 && pop < 384, "population {pop}");
    }

    #[test]
    fn shifted_views_stay_in_bounds() {
        let grid = PaddedGrid::new(8, 8);
        let stride = grid.stride();
        assert_eq!(grid.shifted_view(0).len(), grid.interior_span());
        assert_eq!(grid.shifted_view(2 * stride + 2).len(), grid.interior_span());
    }

    #[test]
    fn write_rows_ignores_border_columns() {
        let mut grid = PaddedGrid::new(3, 2);
        let values = [1u8, 1, 0, 1, 1];
        grid.write_rows(1..2, &values);
        assert!(grid.get(0, 1));
        assert!(!grid.get(1, 1));
        assert!(grid.get(2, 1));
        assert!(grid.border_is_dead());
        assert_eq!(grid.rows(1..2), &[0, 1, 0, 1, 0]);
    }

    #[test]
    fn render_uses_snapshot_alphabet() {
        let grid = PaddedGrid::from_live_cells(3, 2, [(0, 0), (2, 1)]);
        assert_eq!(grid.render(), "xoo\noox\n");
    }

    #[test]
    fn for_each_live_reports_interior_coordinates() {
        let grid = PaddedGrid::from_live_cells(4, 4, [(3, 0), (1, 2)]);
        let mut seen = Vec::new();
        grid.for_each_live(|x, y| seen.push((x, y)));
        assert_eq!(seen, vec![(3, 0), (1, 2)]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_access_panics() {
        let grid = PaddedGrid::new(4, 4);
        grid.get(4, 0);
    }

    #[test]
    fn buffer_len_counts_padding_and_guards() {
        assert_eq!(buffer_len(4, 4), Some(6 * 6 + 2));
        assert_eq!(buffer_len(usize::MAX, 1), None);
        assert_eq!(buffer_len(1 << 40, 1 << 40), None);
    }

    #[test]
    #[should_panic(expected = "too large")]
    fn oversized_grid_panics_instead_of_wrapping() {
        PaddedGrid::new(usize::MAX / 2, 8);
    }
}

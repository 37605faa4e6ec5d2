//! SerialLife: the eight-view sum computed in one address space.
//!
//! Shares every primitive with the distributed engine (offset table,
//! `sum_into`, border correction, rule) so the two can be compared
//! generation by generation. Accepts any grid shape.

use std::time::Instant;

use crate::error::{LifeError, LifeResult};
use crate::grid::PaddedGrid;
use crate::scatterlife::RunReport;
use crate::scatterlife::neighbors::count_all;
use crate::scatterlife::offsets::OffsetTable;
use crate::scatterlife::rules::apply_rule;
use crate::snapshot::SnapshotSink;

pub struct SerialLife {
    grid: PaddedGrid,
    offsets: OffsetTable,
    generation: u64,
}

impl SerialLife {
    pub fn new(grid: PaddedGrid) -> Self {
        Self {
            offsets: OffsetTable::build(grid.width()),
            grid,
            generation: 0,
        }
    }

    pub fn initialize(width: usize, height: usize, seed: u64) -> Self {
        Self::new(PaddedGrid::initialize(width, height, seed))
    }

    /// Live-neighbor count of every position in padded rows `1..=height`.
    pub fn neighbor_counts(&self) -> Vec<u8> {
        count_all(&self.grid, &self.offsets)
    }

    pub fn step(&mut self) {
        let mut next = self.neighbor_counts();
        apply_rule(&mut next, self.grid.rows(0..self.grid.height()));
        self.grid.write_rows(0..self.grid.height(), &next);
        self.generation += 1;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    pub fn run<S: SnapshotSink>(&mut self, n: u64, sink: &mut S) -> LifeResult<RunReport> {
        let start = Instant::now();
        for _ in 0..n {
            let generation = self.generation;
            self.step();
            sink.persist(generation, &self.grid)
                .map_err(|source| LifeError::Snapshot { generation, source })?;
        }
        Ok(RunReport {
            generations: n,
            elapsed: start.elapsed(),
            population: self.population(),
        })
    }

    pub fn grid(&self) -> &PaddedGrid {
        &self.grid
    }

    pub fn get_cell(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }

    pub fn population(&self) -> u64 {
        self.grid.population()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

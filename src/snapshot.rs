//! Per-generation snapshot persistence.
//!
//! The engines only promise to hand over a complete grid once per
//! generation; naming and storage belong to the sink.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::grid::PaddedGrid;

pub trait SnapshotSink {
    fn persist(&mut self, generation: u64, grid: &PaddedGrid) -> io::Result<()>;
}

/// Writes `gen{N}.txt` files into a directory.
#[derive(Clone, Debug)]
pub struct DumpDir {
    dir: PathBuf,
}

impl DumpDir {
    /// Use `dir` for dumps, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, generation: u64) -> PathBuf {
        self.dir.join(format!("gen{generation}.txt"))
    }
}

impl SnapshotSink for DumpDir {
    fn persist(&mut self, generation: u64, grid: &PaddedGrid) -> io::Result<()> {
        let file = fs::File::create(self.path_for(generation))?;
        let mut out = BufWriter::new(file);
        write_snapshot(&mut out, grid)?;
        out.flush()
    }
}

/// Ignores every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl SnapshotSink for Discard {
    fn persist(&mut self, _generation: u64, _grid: &PaddedGrid) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps rendered snapshots in memory, one entry per generation.
impl SnapshotSink for Vec<String> {
    fn persist(&mut self, _generation: u64, grid: &PaddedGrid) -> io::Result<()> {
        self.push(grid.render());
        Ok(())
    }
}

pub fn write_snapshot<W: Write>(out: &mut W, grid: &PaddedGrid) -> io::Result<()> {
    out.write_all(grid.render().as_bytes())
}

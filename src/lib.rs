//! Conway's Game of Life (B3/S23) on a fixed padded grid, with neighbor
//! counts computed by summing eight shifted views of the grid across a
//! group of eight workers.

pub mod error;
pub mod grid;
pub mod scatterlife;
pub mod serial;
pub mod snapshot;

pub use error::{LifeError, LifeResult};
pub use grid::PaddedGrid;
pub use scatterlife::{ScatterLife, ScatterLifeConfig};
pub use serial::SerialLife;

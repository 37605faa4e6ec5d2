//! Single-threaded reference engine.

mod engine;

pub use engine::SerialLife;

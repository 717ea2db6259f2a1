//! Difficulty adjustment module for consensus
//!
//! Block windows, required difficulty and DAA scores.

pub mod manager;
pub mod window;

pub use manager::DifficultyManager;
pub use window::{BlockWindowHeap, BlockWindowManager, BoundedSizeBlockHeap};

//! GHOSTDAG consensus implementation
//!
//! Blue set selection, merge set ordering, and blue score and blue work calculation.

mod mergeset;
pub mod protocol;
#[cfg(test)]
mod integration_test;

pub use protocol::GhostdagManager;

//! JIOSim - blockDAG consensus simulator
//!
//! Runs a devnet consensus engine against a set of simulated miners. Miners
//! build templates over the virtual, hold them back for a random propagation
//! delay and submit them, which produces parallel blocks the engine has to order.

pub mod cli;
pub mod config;
pub mod simulator;
pub mod ui;

pub use cli::Args;
pub use config::Config;
pub use simulator::{SimulationReport, Simulator};

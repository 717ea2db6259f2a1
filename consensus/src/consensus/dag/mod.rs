//! DAG structure for BlockDAG consensus
//!
//! This module provides:
//! - Block relationship tracking (parents/children, tips)
//! - Interval-based reachability queries over the selected-parent tree
//! - Reindexing of the reachability tree when intervals run out

pub mod reachability;
mod reindex;
pub mod topology;
#[cfg(test)]
mod integration_test;

pub use reachability::{ReachabilityManager, ReachabilityService};
pub use topology::DagTopologyManager;

//! Consensus core of the blockDAG engine
//!
//! DAG topology and reachability, GHOSTDAG ordering, difficulty and validation
//! rules, the store bundle, and the engine tying them together.

pub mod dag;
pub mod difficulty;
pub mod engine;
pub mod ghostdag;
pub mod services;
pub mod storage;
pub mod types;
pub mod validation;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use dag::{DagTopologyManager, ReachabilityManager, ReachabilityService};
pub use difficulty::DifficultyManager;
pub use engine::Consensus;
pub use ghostdag::GhostdagManager;
pub use services::ConsensusServices;
pub use storage::ConsensusStorage;
pub use types::{ConsensusConfig, PerfParams};
pub use validation::{BlockValidator, ContextualValidator, HeaderValidator, TransactionValidator};

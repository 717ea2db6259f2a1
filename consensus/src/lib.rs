//! BlockDAG consensus engine
//!
//! Orders blocks with GHOSTDAG, answers ancestry queries through interval
//! reachability, adjusts difficulty, enforces finality and merge depth, maintains
//! the pruning point and computes UTXO acceptance along the selected chain.
//! Every accepted block is committed atomically through one staging area.

pub mod consensus;
pub mod pipeline;
pub mod process;

pub use consensus::{Consensus, ConsensusConfig, ConsensusServices, ConsensusStorage, PerfParams};
pub use consensus_core::api::{BlockInfo, BlockInsertionResult, BlockNotifier, ConsensusApi, VirtualStateInfo};
pub use consensus_core::config::Params;
pub use consensus_core::errors::{ConsensusError, ConsensusResult, RuleError};
pub use consensus_core::Hash;
pub use pipeline::BlockProcessor;

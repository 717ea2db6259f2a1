//! Engine configuration
//!
//! Consensus parameters plus the local performance knobs that do not affect
//! consensus (cache sizes).

use consensus_core::config::Params;
use serde::{Deserialize, Serialize};

/// Store cache capacities, in entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfParams {
    pub header_cache_size: usize,
    pub block_data_cache_size: usize,
    pub utxo_cache_size: usize,
}

impl Default for PerfParams {
    fn default() -> Self {
        Self { header_cache_size: 10_000, block_data_cache_size: 2_000, utxo_cache_size: 10_000 }
    }
}

/// Consensus configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub params: Params,
    pub perf: PerfParams,
}

impl ConsensusConfig {
    pub fn new(params: Params) -> Self {
        Self { params, perf: PerfParams::default() }
    }
}

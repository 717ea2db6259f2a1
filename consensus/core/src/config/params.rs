use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::genesis::{devnet_genesis, mainnet_genesis, GenesisBlock};
use crate::{
    constants::SOMPI_PER_JIO,
    errors::{ConsensusError, ConsensusResult},
    KType,
};

/// Consensus parameters of a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub network_name: String,
    pub genesis: GenesisBlock,

    /// GHOSTDAG k: max anticone size of a blue block within the blue set
    pub ghostdag_k: KType,
    pub max_block_parents: u8,

    /// Milliseconds
    pub target_time_per_block: u64,
    pub difficulty_window_size: usize,
    /// In blocks; the past median time window holds `2 * tolerance - 1` blocks
    pub timestamp_deviation_tolerance: u64,
    /// Easiest allowed target
    pub max_difficulty_target: U256,
    pub disable_difficulty_adjustment: bool,
    pub skip_proof_of_work: bool,

    /// Blue score depths
    pub finality_depth: u64,
    pub merge_depth: u64,
    pub pruning_depth: u64,
    pub enable_pruning: bool,

    /// DAA score distance before a coinbase output may be spent
    pub coinbase_maturity: u64,
    pub max_block_mass: u64,
    /// Max value a coinbase transaction may pay
    pub coinbase_subsidy: u64,

    /// Reachability reindexing
    pub reindex_depth: u64,
    pub reindex_slack: u64,
    /// Size of the reachability root interval
    pub reachability_capacity: u64,
}

impl Params {
    pub fn mainnet() -> Self {
        Self {
            network_name: "jio-mainnet".to_string(),
            genesis: mainnet_genesis(),
            ghostdag_k: 18,
            max_block_parents: 10,
            target_time_per_block: 1000,
            difficulty_window_size: 2641,
            timestamp_deviation_tolerance: 132,
            max_difficulty_target: (U256::one() << 255) - U256::one(),
            disable_difficulty_adjustment: false,
            skip_proof_of_work: false,
            finality_depth: 86_400,
            merge_depth: 3_600,
            pruning_depth: 185_798,
            enable_pruning: true,
            coinbase_maturity: 100,
            max_block_mass: 500_000,
            coinbase_subsidy: 50 * SOMPI_PER_JIO,
            reindex_depth: 100,
            reindex_slack: 1 << 12,
            reachability_capacity: u64::MAX - 1,
        }
    }

    /// Small depths and windows suited for local simulation
    pub fn devnet() -> Self {
        Self {
            network_name: "jio-devnet".to_string(),
            genesis: devnet_genesis(),
            difficulty_window_size: 263,
            finality_depth: 240,
            merge_depth: 240,
            pruning_depth: 600,
            coinbase_maturity: 10,
            skip_proof_of_work: true,
            ..Self::mainnet()
        }
    }

    pub fn past_median_time_window_size(&self) -> usize {
        (2 * self.timestamp_deviation_tolerance - 1) as usize
    }

    /// Max milliseconds a block timestamp may be ahead of the local clock
    pub fn max_future_time_offset(&self) -> u64 {
        self.timestamp_deviation_tolerance * self.target_time_per_block
    }

    pub fn validate(&self) -> ConsensusResult<()> {
        let fail = |msg: &str| Err(ConsensusError::InvalidParams(msg.to_string()));
        if self.ghostdag_k == 0 {
            return fail("ghostdag_k must be positive");
        }
        if self.max_block_parents == 0 {
            return fail("max_block_parents must be positive");
        }
        if self.target_time_per_block == 0 {
            return fail("target_time_per_block must be positive");
        }
        if self.difficulty_window_size < 2 {
            return fail("difficulty_window_size must be at least 2");
        }
        if self.timestamp_deviation_tolerance == 0 {
            return fail("timestamp_deviation_tolerance must be positive");
        }
        if self.finality_depth == 0 || self.merge_depth == 0 {
            return fail("finality and merge depths must be positive");
        }
        if self.pruning_depth < self.finality_depth {
            return fail("pruning_depth must be at least finality_depth");
        }
        if self.reindex_depth == 0 || self.reindex_slack == 0 {
            return fail("reindex depth and slack must be positive");
        }
        if self.reachability_capacity < 2 {
            return fail("reachability capacity must hold genesis and a child");
        }
        if self.max_difficulty_target.is_zero() {
            return fail("max_difficulty_target must be positive");
        }
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::devnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(Params::mainnet().validate().is_ok());
        assert!(Params::devnet().validate().is_ok());
        assert_eq!(Params::default(), Params::devnet());
    }

    #[test]
    fn test_pruning_depth_below_finality_is_rejected() {
        let params = Params { pruning_depth: 10, finality_depth: 20, ..Params::devnet() };
        assert!(matches!(params.validate(), Err(ConsensusError::InvalidParams(_))));
    }

    #[test]
    fn test_window_sizes() {
        let params = Params::devnet();
        assert_eq!(params.past_median_time_window_size(), 263);
        assert_eq!(params.max_future_time_offset(), 132_000);
    }
}

use consensus::{ConsensusConfig as EngineConfig, Params, PerfParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub consensus: ConsensusConfig,
    pub storage: StorageConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: String,
}

/// Overrides applied on top of the network preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub ghostdag_k: u16,
    pub max_block_parents: u8,
    pub target_time_per_block: u64,
    pub finality_depth: u64,
    pub merge_depth: u64,
    pub pruning_depth: u64,
    pub enable_pruning: bool,
    pub coinbase_maturity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub header_cache_size: usize,
    pub block_data_cache_size: usize,
    pub utxo_cache_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub miners: usize,
    pub blocks: u64,
    /// Mean delay between two blocks of one miner
    pub block_interval_ms: u64,
    /// Upper bound of the random delay between building and submitting a block
    pub max_delay_ms: u64,
    /// Share of blocks submitted as a header first and completed with the body right after
    pub header_first_ratio: f64,
    pub seed: Option<u64>,
}

fn preset(network: &str) -> Result<Params, String> {
    match network {
        "devnet" => Ok(Params::devnet()),
        "mainnet" => Ok(Params::mainnet()),
        _ => Err(format!("Unknown network: {}", network)),
    }
}

impl Config {
    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
            toml::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
        } else {
            Ok(Config::default())
        }
    }

    /// Default configuration with the consensus section taken from a network preset
    pub fn for_network(network: &str) -> Result<Self, String> {
        let params = preset(network)?;
        Ok(Self {
            network: NetworkConfig { network_id: network.to_string() },
            consensus: ConsensusConfig::from(&params),
            ..Config::default()
        })
    }

    /// Override config with CLI arguments
    pub fn apply_cli_overrides(&mut self, args: &crate::cli::Args) {
        if let Some(data_dir) = &args.data_dir {
            self.storage.data_dir = data_dir.clone();
        }
        if let Some(miners) = args.miners {
            self.simulation.miners = miners;
        }
        if let Some(blocks) = args.blocks {
            self.simulation.blocks = blocks;
        }
        if let Some(interval) = args.block_interval_ms {
            self.simulation.block_interval_ms = interval;
        }
        if let Some(delay) = args.max_delay_ms {
            self.simulation.max_delay_ms = delay;
        }
        if args.seed.is_some() {
            self.simulation.seed = args.seed;
        }
    }

    /// Engine configuration: the network preset with the consensus overrides applied
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        let c = &self.consensus;
        let params = Params {
            ghostdag_k: c.ghostdag_k,
            max_block_parents: c.max_block_parents,
            target_time_per_block: c.target_time_per_block,
            finality_depth: c.finality_depth,
            merge_depth: c.merge_depth,
            pruning_depth: c.pruning_depth,
            enable_pruning: c.enable_pruning,
            coinbase_maturity: c.coinbase_maturity,
            ..preset(&self.network.network_id)?
        };
        params.validate().map_err(|e| e.to_string())?;

        let perf = PerfParams {
            header_cache_size: self.storage.header_cache_size,
            block_data_cache_size: self.storage.block_data_cache_size,
            utxo_cache_size: self.storage.utxo_cache_size,
        };
        Ok(EngineConfig { params, perf })
    }
}

impl From<&Params> for ConsensusConfig {
    fn from(params: &Params) -> Self {
        Self {
            ghostdag_k: params.ghostdag_k,
            max_block_parents: params.max_block_parents,
            target_time_per_block: params.target_time_per_block,
            finality_depth: params.finality_depth,
            merge_depth: params.merge_depth,
            pruning_depth: params.pruning_depth,
            enable_pruning: params.enable_pruning,
            coinbase_maturity: params.coinbase_maturity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let perf = PerfParams::default();
        Self {
            network: NetworkConfig { network_id: "devnet".to_string() },
            consensus: ConsensusConfig::from(&Params::devnet()),
            storage: StorageConfig {
                data_dir: PathBuf::from("./sim-data"),
                header_cache_size: perf.header_cache_size,
                block_data_cache_size: perf.block_data_cache_size,
                utxo_cache_size: perf.utxo_cache_size,
            },
            simulation: SimulationConfig {
                miners: 4,
                blocks: 1000,
                block_interval_ms: 100,
                max_delay_ms: 50,
                header_first_ratio: 0.1,
                seed: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;

    #[test]
    fn test_default_matches_devnet() {
        let config = Config::default();
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.params, Params::devnet());
        assert_eq!(engine.perf, PerfParams::default());
    }

    #[test]
    fn test_toml_roundtrip_and_overrides() {
        let mut config = Config::for_network("devnet").unwrap();
        config.consensus.finality_depth = 20;
        config.consensus.merge_depth = 20;
        config.consensus.pruning_depth = 40;
        let text = toml::to_string(&config).unwrap();
        let mut parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let args = Args { miners: Some(7), blocks: Some(12), seed: Some(3), ..Default::default() };
        parsed.apply_cli_overrides(&args);
        assert_eq!(parsed.simulation.miners, 7);
        assert_eq!(parsed.simulation.blocks, 12);
        assert_eq!(parsed.simulation.seed, Some(3));

        let engine = parsed.engine_config().unwrap();
        assert_eq!(engine.params.finality_depth, 20);
        assert_eq!(engine.params.difficulty_window_size, Params::devnet().difficulty_window_size);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(Config::for_network("testnet").is_err());
        let mut config = Config::default();
        config.consensus.pruning_depth = 1;
        assert!(config.engine_config().is_err());
    }
}

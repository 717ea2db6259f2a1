use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "jiosim")]
#[command(about = "JIO blockDAG consensus simulator", long_about = None)]
pub struct Args {
    /// Path to configuration file (optional, uses defaults if not provided)
    #[arg(short, long)]
    pub config_path: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Network preset (mainnet, devnet)
    #[arg(short, long)]
    pub network: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Number of simulated miners
    #[arg(long)]
    pub miners: Option<usize>,

    /// Number of blocks to mine before stopping
    #[arg(long)]
    pub blocks: Option<u64>,

    /// Mean delay between two blocks of one miner, in milliseconds
    #[arg(long)]
    pub block_interval_ms: Option<u64>,

    /// Max propagation delay of a mined block, in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Seed of the simulation randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

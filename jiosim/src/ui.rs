//! Console output of the simulator

use crate::config::Config;
use crate::simulator::SimulationReport;

/// ANSI color codes for terminal output
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
}

/// Status types for colored output
#[derive(Debug, Clone, Copy)]
pub enum StatusType {
    Success,
    Warning,
    Error,
}

pub fn print_banner(version: &str, network: &str) {
    println!();
    println!("{}{}JIO BLOCKDAG SIMULATOR v{}{}", colors::BRIGHT_CYAN, colors::BOLD, version, colors::RESET);
    println!("{}Network: {}{}{}", colors::DIM, colors::BRIGHT_GREEN, network, colors::RESET);
    println!();
}

pub fn print_status(icon: &str, message: &str, status: StatusType) {
    let color = match status {
        StatusType::Success => colors::BRIGHT_GREEN,
        StatusType::Warning => colors::BRIGHT_YELLOW,
        StatusType::Error => colors::BRIGHT_RED,
    };
    println!("{}[{}]{} {}", color, icon, colors::RESET, message);
}

pub fn print_section(title: &str) {
    println!();
    println!("{}  {}{}{}", colors::BRIGHT_CYAN, colors::BOLD, title, colors::RESET);
    println!("{}────────────────────────────────────────{}", colors::DIM, colors::RESET);
}

pub fn print_kv(key: &str, value: &str) {
    println!("  {}{}:{} {}{}{}", colors::BRIGHT_WHITE, key, colors::RESET, colors::BRIGHT_CYAN, value, colors::RESET);
}

pub fn print_config_summary(config: &Config) {
    print_section("Configuration");
    print_kv("Network", &config.network.network_id);
    print_kv("Data Directory", config.storage.data_dir.to_str().unwrap_or("N/A"));
    print_kv("GHOSTDAG k", &config.consensus.ghostdag_k.to_string());
    print_kv("Finality Depth", &config.consensus.finality_depth.to_string());
    print_kv("Pruning", if config.consensus.enable_pruning { "Enabled" } else { "Disabled" });
    print_kv("Miners", &config.simulation.miners.to_string());
    print_kv("Blocks", &config.simulation.blocks.to_string());
    print_kv("Block Interval", &format!("{} ms", config.simulation.block_interval_ms));
}

pub fn print_report(report: &SimulationReport) {
    print_section("Simulation Report");
    print_kv("Blocks Submitted", &report.blocks_submitted.to_string());
    print_kv("Rejected", &report.rejected.to_string());
    print_kv("Header-only Commits", &report.header_only_commits.to_string());
    print_kv("Chain Commits", &report.chain_valid_commits.to_string());
    print_kv("Off-chain Commits", &report.pending_commits.to_string());
    print_kv("Disqualified", &report.disqualified_commits.to_string());
    print_kv("Sink", &report.sink.to_string());
    print_kv("Sink Blue Score", &report.sink_blue_score.to_string());
    print_kv("Virtual DAA Score", &report.virtual_daa_score.to_string());
    print_kv("Virtual Bits", &format!("{:#010x}", report.virtual_bits));
    print_kv("Pruning Point", &report.pruning_point.to_string());
    print_kv("Finality Point", &report.finality_point.to_string());
    print_kv("Tips", &report.tips.to_string());
    print_kv("Elapsed", &format!("{} ms", report.elapsed_ms));
}

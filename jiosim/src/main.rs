use jiosim::{cli, ui, Config, Simulator};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = cli::parse_args();
    init_logging(&args);

    let network = args.network.as_deref().unwrap_or("devnet");
    ui::print_banner(env!("CARGO_PKG_VERSION"), network);

    let mut config = if let Some(config_path) = &args.config_path {
        Config::load(config_path).unwrap_or_else(|e| fail(&e))
    } else {
        Config::for_network(network).unwrap_or_else(|e| fail(&e))
    };
    config.apply_cli_overrides(&args);
    ui::print_config_summary(&config);

    let simulator = Simulator::open(&config).unwrap_or_else(|e| fail(&format!("Failed to open consensus: {}", e)));
    let report = simulator.run().await.unwrap_or_else(|e| fail(&format!("Simulation failed: {}", e)));

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&format!("Failed to encode report: {}", e)),
        }
    } else {
        ui::print_report(&report);
    }
    ui::print_status("✓", "Simulation finished", ui::StatusType::Success);
    info!("simulation finished with sink {}", report.sink);
}

fn fail(message: &str) -> ! {
    ui::print_status("✗", message, ui::StatusType::Error);
    error!("{}", message);
    process::exit(1);
}

fn init_logging(args: &cli::Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).with_target(true).with_thread_ids(true).init();
}

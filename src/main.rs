//! API scenario runner
//!
//! Runs declarative HTTP scenarios from YAML files against a service and
//! reports which steps matched their expected status and fields.

use clap::Parser;
use std::path::PathBuf;

use api_scenarios::common::logging;
use api_scenarios::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "api-scenarios", about = "Declarative HTTP contract scenarios")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a file; bare `--log-file` uses the data dir,
    /// `--log-file=PATH` picks the file
    #[arg(long, global = true, num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => logging::default_log_path(),
        None => None,
    };
    let log_guard = logging::init_cli(log_path.as_deref());

    if let Err(e) = cli::dispatch(cli.command, cli.config.as_deref()).await {
        eprintln!("Error: {e}");
        // exit() skips destructors, flush the log file first
        drop(log_guard);
        std::process::exit(1);
    }
}

//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenario files against a service
    Run {
        /// Scenario files or directories of *.yaml files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Root URL of the service (overrides target.base_url)
        #[arg(long)]
        base_url: Option<String>,

        /// Per-request timeout in seconds (default: 30)
        #[arg(long)]
        timeout: Option<u64>,

        /// Number of scenarios to run at once (default: 1)
        #[arg(long, short = 'j')]
        concurrency: Option<usize>,

        /// Fail scenarios still running after this many seconds
        #[arg(long)]
        suite_timeout: Option<u64>,

        /// Also write a JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Show extracted values for passing steps
        #[arg(long, short)]
        verbose: bool,
    },

    /// Check scenario files without sending any request
    Validate {
        /// Scenario files or directories of *.yaml files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

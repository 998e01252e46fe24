//! CLI command handling
//!
//! Loads configuration and scenarios, runs them, and maps the outcome to
//! the process exit status.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::Commands;
use crate::common::config::{Config, Overrides};
use crate::common::{Error, Result};
use crate::http::ReqwestTransport;
use crate::testing::{
    load_scenarios, ConsoleReporter, FanOut, JsonReporter, StepExecutor, SuiteDriver,
};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Run {
            paths,
            base_url,
            timeout,
            concurrency,
            suite_timeout,
            report,
            verbose,
        } => {
            let config = Config::load(config_path)?;
            let overrides = Overrides {
                base_url,
                timeout_secs: timeout,
                concurrency,
                suite_timeout_secs: suite_timeout,
                report_json: report,
            };
            run(&config, overrides, &paths, verbose).await
        }

        Commands::Validate { paths } => validate(&paths),
    }
}

async fn run(config: &Config, overrides: Overrides, paths: &[PathBuf], verbose: bool) -> Result<()> {
    let settings = config.resolve(overrides)?;
    let scenarios = load_scenarios(paths)?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let executor =
        StepExecutor::new(transport, settings.base_url.clone()).with_timeout(settings.request_timeout);
    let driver = SuiteDriver::new(executor)
        .with_concurrency(settings.concurrency)
        .with_timeout(settings.suite_timeout);

    let mut sink = FanOut::new().with(Box::new(ConsoleReporter::new(verbose)));
    if let Some(path) = &settings.report_json {
        sink = sink.with(Box::new(JsonReporter::new(path)));
    }

    let summary = driver.run(&scenarios, &mut sink).await;

    if summary.all_passed() {
        Ok(())
    } else {
        Err(Error::SuiteFailed {
            failed: summary.failed,
            total: summary.total,
        })
    }
}

fn validate(paths: &[PathBuf]) -> Result<()> {
    let scenarios = load_scenarios(paths)?;
    let mut invalid = 0;

    for scenario in &scenarios {
        let undefined = scenario.undefined_references();
        if undefined.is_empty() {
            println!(
                "{} {} {}",
                "✓".green(),
                scenario.name,
                format!("({} steps)", scenario.steps.len()).dimmed()
            );
            continue;
        }

        invalid += 1;
        println!("{} {}", "✗".red(), scenario.name);
        for reference in undefined {
            println!(
                "    step {}: '{}' is never extracted by an earlier step",
                reference.step,
                reference.key.yellow()
            );
        }
    }

    if invalid == 0 {
        Ok(())
    } else {
        Err(Error::ValidationFailed(invalid))
    }
}

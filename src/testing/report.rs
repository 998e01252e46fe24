//! Report sinks
//!
//! The suite driver hands every finished scenario to a [`ReportSink`] and
//! calls [`ReportSink::finish`] once with the totals.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::common::paths::ensure_parent_dir;
use crate::common::{Error, Result, StepFailure};

use super::result::{ScenarioResult, StepResult, SuiteSummary};

/// Destination for scenario outcomes
pub trait ReportSink: Send {
    /// Called once per scenario, in suite order
    fn record(&mut self, result: &ScenarioResult) -> Result<()>;

    /// Called once after the last scenario
    fn finish(&mut self, summary: &SuiteSummary) -> Result<()> {
        let _ = summary;
        Ok(())
    }
}

/// Coloured terminal output
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn print_step(&self, step: &StepResult) {
        let target = step.path.as_deref().unwrap_or("<unresolved>");
        let status = step
            .actual_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        if step.passed() {
            println!(
                "  {} Step {}: {} {}",
                "✓".green(),
                step.index,
                step.label,
                format!("({} {} -> {}, {}ms)", step.method, target, status, step.duration_ms).dimmed()
            );
            if self.verbose {
                for extraction in &step.extracted {
                    println!(
                        "      {} = {}",
                        extraction.key.cyan(),
                        extraction.value.to_string().dimmed()
                    );
                }
            }
        } else {
            println!("  {} Step {}: {}", "✗".red(), step.index, step.label);
            println!("      {} {}", step.method, target.dimmed());
            if let Some(failure) = &step.failure {
                println!("      {}", failure_line(failure).red());
            }
        }
    }
}

/// `[CODE] message` for one step failure
fn failure_line(failure: &StepFailure) -> String {
    format!("[{}] {}", failure.code(), failure)
}

impl ReportSink for ConsoleReporter {
    fn record(&mut self, result: &ScenarioResult) -> Result<()> {
        println!("\n{} {}", "Scenario:".blue().bold(), result.name.white().bold());

        for step in &result.steps {
            self.print_step(step);
        }

        let skipped = result.steps_total - result.steps_run();
        if skipped > 0 {
            println!("  {}", format!("{} step(s) not run", skipped).dimmed());
        }

        if result.passed() {
            println!("{} {}", "✓".green().bold(), "Passed".green().bold());
        } else {
            println!("{} {}", "✗".red().bold(), "Failed".red().bold());
        }
        Ok(())
    }

    fn finish(&mut self, summary: &SuiteSummary) -> Result<()> {
        let line = format!(
            "{} passed, {} failed, {} total ({}ms)",
            summary.passed, summary.failed, summary.total, summary.duration_ms
        );
        if summary.all_passed() {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a SuiteSummary,
    scenarios: &'a [ScenarioResult],
}

/// Writes all results to a JSON file when the suite finishes
pub struct JsonReporter {
    path: PathBuf,
    results: Vec<ScenarioResult>,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            results: Vec::new(),
        }
    }
}

impl ReportSink for JsonReporter {
    fn record(&mut self, result: &ScenarioResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &SuiteSummary) -> Result<()> {
        let report = JsonReport {
            summary,
            scenarios: &self.results,
        };
        let json = serde_json::to_string_pretty(&report)?;

        ensure_parent_dir(&self.path)
            .and_then(|()| std::fs::write(&self.path, json))
            .map_err(|e| {
                Error::Report(format!("Failed to write '{}': {}", self.path.display(), e))
            })?;

        tracing::info!("Wrote JSON report to {}", self.path.display());
        Ok(())
    }
}

/// Keeps results in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub results: Vec<ScenarioResult>,
    pub summary: Option<SuiteSummary>,
}

impl ReportSink for MemoryReporter {
    fn record(&mut self, result: &ScenarioResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &SuiteSummary) -> Result<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}

/// Forwards to several sinks; one failing sink doesn't starve the others
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ReportSink for FanOut {
    fn record(&mut self, result: &ScenarioResult) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.record(result) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn finish(&mut self, summary: &SuiteSummary) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish(summary) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

//! Suite driver
//!
//! Runs independent scenarios, each with its own context, and reports every
//! outcome. Up to `concurrency` scenarios are in flight at once; results are
//! still recorded in suite order.

use futures_util::stream::{self, StreamExt};
use std::time::{Duration, Instant};

use super::config::Scenario;
use super::executor::StepExecutor;
use super::report::ReportSink;
use super::runner::ScenarioRunner;
use super::result::SuiteSummary;

/// Runs a collection of scenarios against one service
pub struct SuiteDriver {
    executor: StepExecutor,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl SuiteDriver {
    pub fn new(executor: StepExecutor) -> Self {
        Self {
            executor,
            concurrency: 1,
            timeout: None,
        }
    }

    /// Maximum scenarios in flight, at least one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Budget for the whole suite
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run every scenario and hand each result to `sink`
    ///
    /// A failing scenario or sink never stops the remaining scenarios.
    pub async fn run(&self, scenarios: &[Scenario], sink: &mut dyn ReportSink) -> SuiteSummary {
        let clock = Instant::now();
        let deadline = self.timeout.map(|t| tokio::time::Instant::now() + t);
        let runner = ScenarioRunner::new(self.executor.clone()).with_deadline(deadline);

        tracing::info!(
            "Running {} scenario(s) against {} (concurrency {})",
            scenarios.len(),
            self.executor.base_url(),
            self.concurrency
        );

        let mut summary = SuiteSummary::default();
        let runner = &runner;
        let mut results = std::pin::pin!(stream::iter(scenarios)
            .map(move |scenario| runner.run(scenario))
            .buffered(self.concurrency));

        while let Some(result) = results.next().await {
            summary.add(&result);
            if let Err(e) = sink.record(&result) {
                tracing::warn!("Failed to record result for '{}': {}", result.name, e);
            }
        }

        summary.duration_ms = clock.elapsed().as_millis() as u64;
        if let Err(e) = sink.finish(&summary) {
            tracing::warn!("Failed to finish report: {}", e);
        }

        tracing::info!(
            "Suite finished: {} passed, {} failed",
            summary.passed,
            summary.failed
        );
        summary
    }
}

//! Scenario runner
//!
//! Executes a scenario's steps in order over one fresh context and stops at
//! the first failing step. Later steps depend on values earlier steps
//! extract, so nothing after a failure is sent.

use std::time::Instant;

use crate::common::StepFailure;

use super::config::{Scenario, Step};
use super::context::Context;
use super::executor::StepExecutor;
use super::result::{ScenarioResult, StepResult};

/// Runs scenarios one step at a time
#[derive(Clone)]
pub struct ScenarioRunner {
    executor: StepExecutor,
    deadline: Option<tokio::time::Instant>,
}

impl ScenarioRunner {
    pub fn new(executor: StepExecutor) -> Self {
        Self {
            executor,
            deadline: None,
        }
    }

    /// Fail any step still pending when `deadline` passes
    pub fn with_deadline(mut self, deadline: Option<tokio::time::Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run `scenario` with a fresh context
    pub async fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let mut ctx = Context::new();
        self.run_with_context(scenario, &mut ctx).await
    }

    /// Run `scenario` over a caller-supplied context
    ///
    /// Lets callers inspect what the scenario extracted once it finishes.
    pub async fn run_with_context(&self, scenario: &Scenario, ctx: &mut Context) -> ScenarioResult {
        let clock = Instant::now();
        let mut result = ScenarioResult::pending(&scenario.name, scenario.steps.len());
        result.start();
        tracing::info!("Running scenario '{}' ({} steps)", scenario.name, scenario.steps.len());

        for (i, step) in scenario.steps.iter().enumerate() {
            let step_num = i + 1;
            let step_result = self.run_step(step, step_num, ctx).await;
            let failed = !step_result.passed();
            result.record(step_result);

            if failed {
                break;
            }
        }

        result.conclude(clock.elapsed());

        match result.root_cause() {
            None => tracing::info!("Scenario '{}' passed", scenario.name),
            Some(cause) => tracing::info!(
                "Scenario '{}' failed at step {} ({}): {}",
                scenario.name,
                cause.index,
                cause.label,
                cause
                    .failure
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default()
            ),
        }

        result
    }

    async fn run_step(
        &self,
        step: &Step,
        step_num: usize,
        ctx: &mut Context,
    ) -> StepResult {
        let Some(deadline) = self.deadline else {
            return self.executor.execute(step, step_num, ctx).await;
        };

        let clock = Instant::now();
        if tokio::time::Instant::now() >= deadline {
            return StepResult::begin(step_num, step)
                .conclude(Err(StepFailure::SuiteDeadline), clock.elapsed());
        }

        match tokio::time::timeout_at(deadline, self.executor.execute(step, step_num, ctx)).await {
            Ok(step_result) => step_result,
            Err(_) => StepResult::begin(step_num, step)
                .conclude(Err(StepFailure::SuiteDeadline), clock.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
    use crate::testing::ScenarioState;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Answers every request with the status encoded as the last path segment
    #[derive(Default)]
    struct EchoStatus {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for EchoStatus {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let status = request
                .url
                .rsplit('/')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(200);
            Ok(HttpResponse::json(status, &json!({"id": self.calls.load(Ordering::SeqCst)})))
        }
    }

    fn runner(transport: Arc<dyn Transport>) -> ScenarioRunner {
        ScenarioRunner::new(StepExecutor::new(transport, "http://svc"))
    }

    #[tokio::test]
    async fn test_all_steps_pass() {
        let transport = Arc::new(EchoStatus::default());
        let scenario = Scenario::new("happy")
            .with_step(Step::post("/201").expect_status(201).extract("id", "first"))
            .with_step(Step::get("/items/{{first}}/200").expect_status(200));

        let result = runner(transport.clone()).run(&scenario).await;

        assert_eq!(result.state, ScenarioState::Passed);
        assert_eq!(result.steps_run(), 2);
        assert_eq!(result.steps[1].path.as_deref(), Some("/items/1/200"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let transport = Arc::new(EchoStatus::default());
        let scenario = Scenario::new("stops")
            .with_step(Step::get("/200"))
            .with_step(Step::get("/500"))
            .with_step(Step::get("/200"))
            .with_step(Step::get("/200"));

        let result = runner(transport.clone()).run(&scenario).await;

        assert_eq!(result.state, ScenarioState::Failed);
        assert_eq!(result.steps_run(), 2);
        assert_eq!(result.steps_total, 4);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.root_cause().unwrap().index, 2);
    }

    #[tokio::test]
    async fn test_context_is_fresh_per_run() {
        let transport = Arc::new(EchoStatus::default());
        let producer = Scenario::new("producer")
            .with_step(Step::post("/201").expect_status(201).extract("id", "company_id"));
        let consumer = Scenario::new("consumer").with_step(Step::get("/company/{{company_id}}"));

        let shared = runner(transport);
        assert!(shared.run(&producer).await.passed());

        let result = shared.run(&consumer).await;
        assert_eq!(
            result.root_cause().unwrap().failure,
            Some(StepFailure::missing_key("company_id"))
        );
    }

    #[tokio::test]
    async fn test_run_with_context_exposes_extractions() {
        let scenario = Scenario::new("expose")
            .with_step(Step::post("/201").expect_status(201).extract("id", "company_id"));
        let mut ctx = Context::new();

        let result = runner(Arc::new(EchoStatus::default()))
            .run_with_context(&scenario, &mut ctx)
            .await;

        assert!(result.passed());
        assert_eq!(ctx.get("company_id").unwrap(), &json!(1));
    }

    struct Slow;

    #[async_trait]
    impl Transport for Slow {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_pending_step() {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        let scenario = Scenario::new("late")
            .with_step(Step::get("/slow"))
            .with_step(Step::get("/never"));

        let result = runner(Arc::new(Slow))
            .with_deadline(Some(deadline))
            .run(&scenario)
            .await;

        assert_eq!(result.state, ScenarioState::Failed);
        assert_eq!(result.steps_run(), 1);
        assert_eq!(result.steps[0].failure, Some(StepFailure::SuiteDeadline));
    }
}

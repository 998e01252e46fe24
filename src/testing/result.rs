//! Outcomes of steps, scenarios and suites

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::common::StepFailure;
use crate::http::Method;

use super::config::Step;

/// Pass/fail verdict of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
}

/// A value a step wrote into the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub key: String,
    pub value: Value,
}

/// Outcome of executing one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based position in the scenario
    pub index: usize,
    pub label: String,
    pub method: Method,
    /// Resolved path, absent when resolution failed
    pub path: Option<String>,
    pub expected_status: u16,
    /// Absent when no response arrived
    pub actual_status: Option<u16>,
    pub verdict: Verdict,
    pub failure: Option<StepFailure>,
    pub extracted: Vec<Extraction>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl StepResult {
    /// Start a record for `step`; the executor fills in the rest
    pub fn begin(index: usize, step: &Step) -> Self {
        Self {
            index,
            label: step.label(),
            method: step.method,
            path: None,
            expected_status: step.expect.status,
            actual_status: None,
            verdict: Verdict::Passed,
            failure: None,
            extracted: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    /// Record the outcome and elapsed time
    pub fn conclude(
        mut self,
        outcome: Result<Vec<Extraction>, StepFailure>,
        elapsed: Duration,
    ) -> Self {
        match outcome {
            Ok(extracted) => {
                self.verdict = Verdict::Passed;
                self.extracted = extracted;
            }
            Err(failure) => {
                self.verdict = Verdict::Failed;
                self.failure = Some(failure);
            }
        }
        self.duration_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

/// Lifecycle of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Pending,
    Running,
    Passed,
    Failed,
}

/// Outcome of running one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub state: ScenarioState,
    /// One entry per executed step, in order
    pub steps: Vec<StepResult>,
    pub steps_total: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn pending(name: impl Into<String>, steps_total: usize) -> Self {
        Self {
            name: name.into(),
            state: ScenarioState::Pending,
            steps: Vec::new(),
            steps_total,
            started_at: None,
            duration_ms: 0,
        }
    }

    pub fn start(&mut self) {
        self.state = ScenarioState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn record(&mut self, step: StepResult) {
        self.steps.push(step);
    }

    /// Passed iff every step ran and passed
    pub fn conclude(&mut self, elapsed: Duration) {
        let all_passed =
            self.steps.len() == self.steps_total && self.steps.iter().all(StepResult::passed);
        self.state = if all_passed {
            ScenarioState::Passed
        } else {
            ScenarioState::Failed
        };
        self.duration_ms = elapsed.as_millis() as u64;
    }

    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }

    pub fn steps_run(&self) -> usize {
        self.steps.len()
    }

    /// The first failing step
    pub fn root_cause(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.passed())
    }
}

/// Aggregate counts for a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl SuiteSummary {
    pub fn add(&mut self, result: &ScenarioResult) {
        self.total += 1;
        if result.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

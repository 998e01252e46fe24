//! Step executor
//!
//! Runs exactly one step: resolve templates, send the request, check the
//! status and field expectations, extract values. Every outcome, including
//! timeouts and connection failures, comes back as a [`StepResult`].

use serde_json::{Number, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::StepFailure;
use crate::http::{join_url, HttpRequest, HttpResponse, Transport, TransportError};

use super::config::Step;
use super::context::Context;
use super::path::FieldPath;
use super::result::{Extraction, StepResult};

/// Per-request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes steps against one base URL through a shared transport
#[derive(Clone)]
pub struct StepExecutor {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl StepExecutor {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `step` as step number `index`
    ///
    /// The context is only written when the step passes.
    pub async fn execute(&self, step: &Step, index: usize, ctx: &mut Context) -> StepResult {
        let clock = Instant::now();
        let mut result = StepResult::begin(index, step);
        let outcome = self.attempt(step, ctx, &mut result).await;

        match &outcome {
            Ok(extracted) => tracing::debug!(
                "Step {} passed: {} ({} value(s) extracted)",
                index,
                result.label,
                extracted.len()
            ),
            Err(failure) => tracing::debug!("Step {} failed: {}: {}", index, result.label, failure),
        }

        result.conclude(outcome, clock.elapsed())
    }

    async fn attempt(
        &self,
        step: &Step,
        ctx: &mut Context,
        result: &mut StepResult,
    ) -> Result<Vec<Extraction>, StepFailure> {
        let path = ctx.resolve_str(&step.path)?;
        result.path = Some(path.clone());
        let body = step.body.as_ref().map(|b| ctx.resolve(b)).transpose()?;

        let request = HttpRequest {
            method: step.method,
            url: join_url(&self.base_url, &path),
            body,
        };
        tracing::debug!("{} {}", request.method, request.url);

        let response = self.send(request).await?;
        result.actual_status = Some(response.status);

        if response.status != step.expect.status {
            return Err(StepFailure::AssertionMismatch {
                expected: step.expect.status,
                actual: response.status,
            });
        }

        if step.expect.body.is_empty() && step.extract.is_empty() {
            return Ok(Vec::new());
        }
        let json = response.parse_json();

        for assertion in &step.expect.body {
            let actual = lookup(json.as_ref(), &assertion.path)?;
            let expected = ctx.resolve(&assertion.equals)?;
            if !values_match(actual, &expected) {
                return Err(StepFailure::FieldMismatch {
                    path: assertion.path.clone(),
                    expected,
                    actual: actual.clone(),
                });
            }
        }

        let mut extracted = Vec::with_capacity(step.extract.len());
        for rule in &step.extract {
            let value = lookup(json.as_ref(), &rule.from)?;
            if value.is_null() {
                return Err(StepFailure::extraction_failed(&rule.from, "field is null"));
            }
            extracted.push(Extraction {
                key: rule.to.clone(),
                value: value.clone(),
            });
        }

        for extraction in &extracted {
            ctx.set(extraction.key.clone(), extraction.value.clone());
        }
        Ok(extracted)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, StepFailure> {
        let timeout_ms = self.timeout.as_millis() as u64;
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(TransportError::Timeout)) | Err(_) => Err(StepFailure::Timeout { timeout_ms }),
            Ok(Err(TransportError::Connection(message))) => {
                Err(StepFailure::TransportError { message })
            }
        }
    }
}

/// Navigate a parsed body, turning every miss into an extraction failure
fn lookup<'a>(body: Option<&'a Value>, raw_path: &str) -> Result<&'a Value, StepFailure> {
    let path =
        FieldPath::parse(raw_path).map_err(|e| StepFailure::extraction_failed(raw_path, e))?;
    let body =
        body.ok_or_else(|| StepFailure::extraction_failed(raw_path, "response body is not JSON"))?;
    path.navigate(body)
        .ok_or_else(|| StepFailure::extraction_failed(raw_path, "field not present"))
}

/// Equality that treats 42 and 42.0 as the same number, at any depth
fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_match(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_match(x, y)))
        }
        _ => actual == expected,
    }
}

/// Integers compare exactly; floats only when either side is one
fn numbers_match(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if a.is_f64() || b.is_f64() {
        return matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y);
    }
    a == b
}

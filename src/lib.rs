//! API scenario runner - declarative HTTP contract tests
//!
//! This library runs ordered request/assertion scenarios against a REST
//! service, chaining values extracted from one response into later requests.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result, StepFailure};
pub use http::{HttpRequest, HttpResponse, Method, Transport, TransportError};
pub use testing::{Context, Scenario, ScenarioResult, ScenarioRunner, Step, StepExecutor, SuiteDriver};

//! Scenario engine
//!
//! Loads declarative HTTP scenarios, runs their steps in order against a
//! service, chains extracted values between steps through a per-scenario
//! context, and reports structured results.

mod config;
mod context;
mod executor;
mod path;
mod report;
mod result;
mod runner;
mod suite;

pub use config::*;
pub use context::{references, references_str, Context};
pub use executor::{StepExecutor, DEFAULT_TIMEOUT};
pub use path::FieldPath;
pub use report::{ConsoleReporter, FanOut, JsonReporter, MemoryReporter, ReportSink};
pub use result::{Extraction, ScenarioResult, ScenarioState, StepResult, SuiteSummary, Verdict};
pub use runner::ScenarioRunner;
pub use suite::SuiteDriver;

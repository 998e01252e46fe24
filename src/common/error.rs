//! Error types for the scenario runner
//!
//! Two layers live here. [`Error`] is returned by operations that can fail
//! before or around a run (loading config, parsing scenario files, writing
//! reports). [`StepFailure`] describes why a single step failed; it never
//! propagates as an `Err` past the step boundary and instead ends up inside
//! a [`StepResult`](crate::testing::StepResult).

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Scenario Errors ===
    #[error("Failed to parse scenario file '{path}': {error}")]
    ScenarioParse { path: String, error: String },

    #[error("Invalid scenario '{scenario}': {reason}")]
    InvalidScenario { scenario: String, reason: String },

    #[error("No scenario files found in {0}")]
    NoScenarios(String),

    // === Run Errors ===
    #[error("{failed} of {total} scenarios failed")]
    SuiteFailed { failed: usize, total: usize },

    #[error("{0} scenario(s) failed validation")]
    ValidationFailed(usize),

    #[error("Report sink error: {0}")]
    Report(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a scenario parse error for a file
    pub fn scenario_parse(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::ScenarioParse {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create an invalid scenario error
    pub fn invalid_scenario(scenario: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            scenario: scenario.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a step failed
///
/// Serialized with a `kind` tag so report consumers can group failures
/// without parsing messages.
#[derive(Error, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
    #[error("expected status {expected}, got {actual}")]
    AssertionMismatch { expected: u16, actual: u16 },

    #[error("field '{path}' expected {expected}, got {actual}")]
    FieldMismatch {
        path: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    },

    #[error("could not extract '{path}': {reason}")]
    ExtractionFailed { path: String, reason: String },

    #[error("context key '{key}' is not set")]
    MissingKey { key: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("suite deadline reached before the step completed")]
    SuiteDeadline,

    #[error("transport error: {message}")]
    TransportError { message: String },
}

impl StepFailure {
    /// Create a missing key failure
    pub fn missing_key(key: &str) -> Self {
        Self::MissingKey {
            key: key.to_string(),
        }
    }

    /// Create an extraction failure
    pub fn extraction_failed(path: &str, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, mirrors the serde tag
    pub fn code(&self) -> &'static str {
        match self {
            Self::AssertionMismatch { .. } => "ASSERTION_MISMATCH",
            Self::FieldMismatch { .. } => "FIELD_MISMATCH",
            Self::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            Self::MissingKey { .. } => "MISSING_KEY",
            Self::Timeout { .. } => "TIMEOUT",
            Self::SuiteDeadline => "SUITE_DEADLINE",
            Self::TransportError { .. } => "TRANSPORT_ERROR",
        }
    }
}

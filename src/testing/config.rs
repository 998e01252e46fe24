//! Scenario definitions
//!
//! Defines the data structures for YAML scenario files, plus a builder API
//! for constructing scenarios in code.
//!
//! ```yaml
//! name: create and fetch a company
//! steps:
//!   - name: create
//!     method: POST
//!     path: /company
//!     body: { name: "Acme", state: "EUA" }
//!     expect: { status: 201 }
//!     extract:
//!       - { from: id, to: company_id }
//!   - method: GET
//!     path: /company/{{company_id}}
//!     expect:
//!       status: 200
//!       body:
//!         - { path: id, equals: "{{company_id}}" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::http::Method;

use super::context::{references, references_str};
use super::path::FieldPath;

/// A named, ordered sequence of steps sharing one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

/// One request, its expectations, and what to extract from the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Label shown in reports, defaults to "METHOD path"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub method: Method,
    /// Path template appended to the base URL
    pub path: String,
    /// JSON body template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub expect: Expectation,
    /// Applied in order after the expectations pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extract: Vec<ExtractRule>,
}

/// What a response must look like for the step to pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Expected HTTP status code
    pub status: u16,
    /// Fields that must equal the given values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<FieldAssertion>,
}

/// Equality check on one response field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldAssertion {
    pub path: String,
    /// Expected value, may contain placeholders
    pub equals: Value,
}

/// Copy a response field into the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractRule {
    /// Field path in the response body
    pub from: String,
    /// Context key to store under
    pub to: String,
}

/// A placeholder no earlier step extracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedReference {
    /// 1-based step number
    pub step: usize,
    pub key: String,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Structural checks that don't need the service
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "name is empty"));
        }
        if self.steps.is_empty() {
            return Err(Error::invalid_scenario(&self.name, "scenario has no steps"));
        }

        for (i, step) in self.steps.iter().enumerate() {
            let step_num = i + 1;
            let fail = |reason: String| {
                Error::invalid_scenario(&self.name, format!("step {}: {}", step_num, reason))
            };

            if !(100..=599).contains(&step.expect.status) {
                return Err(fail(format!(
                    "expected status {} is not a valid HTTP status",
                    step.expect.status
                )));
            }
            for assertion in &step.expect.body {
                FieldPath::parse(&assertion.path).map_err(fail)?;
            }
            for rule in &step.extract {
                FieldPath::parse(&rule.from).map_err(fail)?;
                if rule.to.trim().is_empty() {
                    return Err(fail(format!("extract from '{}' has an empty key", rule.from)));
                }
            }
        }

        Ok(())
    }

    /// Placeholders that reference keys no earlier step extracts
    pub fn undefined_references(&self) -> Vec<UndefinedReference> {
        let mut defined: HashSet<&str> = HashSet::new();
        let mut undefined = Vec::new();

        for (i, step) in self.steps.iter().enumerate() {
            for key in step.references() {
                if !defined.contains(key.as_str()) {
                    undefined.push(UndefinedReference { step: i + 1, key });
                }
            }
            defined.extend(step.extract.iter().map(|rule| rule.to.as_str()));
        }

        undefined
    }
}

impl Step {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            name: None,
            method,
            path: path.into(),
            body: None,
            expect: Expectation {
                status: 200,
                body: Vec::new(),
            },
            extract: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect.status = status;
        self
    }

    pub fn expect_field(mut self, path: impl Into<String>, equals: Value) -> Self {
        self.expect.body.push(FieldAssertion {
            path: path.into(),
            equals,
        });
        self
    }

    pub fn extract(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.extract.push(ExtractRule {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Label used in reports
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.path),
        }
    }

    /// Context keys this step reads, in resolution order
    pub fn references(&self) -> Vec<String> {
        let mut keys = references_str(&self.path);
        if let Some(body) = &self.body {
            keys.extend(references(body));
        }
        for assertion in &self.expect.body {
            keys.extend(references(&assertion.equals));
        }
        keys
    }
}

/// Parse scenarios from YAML text
///
/// A file holds either one scenario mapping or a list of them.
pub fn parse_scenarios(content: &str, origin: &Path) -> Result<Vec<Scenario>> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| Error::scenario_parse(origin, e))?;

    let scenarios = if document.is_sequence() {
        serde_yaml::from_value::<Vec<Scenario>>(document)
    } else {
        serde_yaml::from_value::<Scenario>(document).map(|scenario| vec![scenario])
    }
    .map_err(|e| Error::scenario_parse(origin, e))?;

    for scenario in &scenarios {
        scenario.validate()?;
    }
    Ok(scenarios)
}

/// Load every scenario from the given files and directories
///
/// Directories contribute their `*.yaml` and `*.yml` files in name order.
pub fn load_scenarios(paths: &[PathBuf]) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();

    for file in expand_paths(paths)? {
        let content = std::fs::read_to_string(&file).map_err(|e| Error::FileRead {
            path: file.display().to_string(),
            error: e.to_string(),
        })?;
        let parsed = parse_scenarios(&content, &file)?;
        tracing::debug!("Loaded {} scenario(s) from {}", parsed.len(), file.display());
        scenarios.extend(parsed);
    }

    Ok(scenarios)
}

/// Expand directories into the scenario files they contain
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_scenario_file(p))
                .collect();
            if found.is_empty() {
                return Err(Error::NoScenarios(path.display().to_string()));
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn is_scenario_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

//! Per-scenario context store
//!
//! Values extracted from responses are stored here under symbolic keys and
//! substituted into later steps through `{{key}}` placeholders.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::common::StepFailure;

/// Key/value store owned by exactly one running scenario
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Look up a value, failing if it was never extracted
    pub fn get(&self, key: &str) -> Result<&Value, StepFailure> {
        self.values
            .get(key)
            .ok_or_else(|| StepFailure::missing_key(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitute every placeholder in a string template
    pub fn resolve_str(&self, template: &str) -> Result<String, StepFailure> {
        let mut out = String::with_capacity(template.len());
        for segment in segments(template) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Key(key) => out.push_str(&interpolated(self.get(key)?)),
            }
        }
        Ok(out)
    }

    /// Substitute placeholders throughout a JSON structure
    ///
    /// A string consisting of a single placeholder is replaced by the stored
    /// value itself, so numeric ids stay numeric. Object keys are left as is.
    pub fn resolve(&self, template: &Value) -> Result<Value, StepFailure> {
        match template {
            Value::String(s) => match whole_placeholder(s) {
                Some(key) => Ok(self.get(key)?.clone()),
                None => Ok(Value::String(self.resolve_str(s)?)),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    resolved.insert(k.clone(), self.resolve(v)?);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Placeholder keys referenced by a string template, in order
pub fn references_str(template: &str) -> Vec<String> {
    segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Key(key) => Some(key.to_string()),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Placeholder keys referenced anywhere in a JSON template, in document order
pub fn references(template: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    collect_references(template, &mut keys);
    keys
}

fn collect_references(value: &Value, keys: &mut Vec<String>) {
    match value {
        Value::String(s) => keys.extend(references_str(s)),
        Value::Array(items) => items.iter().for_each(|item| collect_references(item, keys)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, keys)),
        _ => {}
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Key(&'a str),
}

/// Split a template into literal text and `{{key}}` references
///
/// An unterminated `{{` and an empty `{{}}` are kept as literal text.
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };

        let key = after_open[..close].trim();
        if key.is_empty() {
            out.push(Segment::Literal(&rest[..open + 4 + close]));
        } else {
            if open > 0 {
                out.push(Segment::Literal(&rest[..open]));
            }
            out.push(Segment::Key(key));
        }
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

fn whole_placeholder(s: &str) -> Option<&str> {
    match segments(s).as_slice() {
        [Segment::Key(key)] => Some(*key),
        _ => None,
    }
}

fn interpolated(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

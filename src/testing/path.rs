//! Field paths into JSON response bodies
//!
//! Accepted forms: `id`, `product.productId`, `0.id`, `[0].id`,
//! `items[2].name`. The empty path and `$` select the whole body; a leading
//! `$.` is ignored.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object member
    Key(String),
    /// Array element from `[n]`
    Index(usize),
    /// Bare number: array element, or object member with that name
    Number(usize),
}

/// A parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("$.")
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for part in body.split('.') {
                parse_part(part, &mut segments)
                    .map_err(|e| format!("invalid field path '{}': {}", raw, e))?;
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Follow the path through `value`
    pub fn navigate<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(i) | Segment::Number(i), Value::Array(items)) => items.get(*i),
                (Segment::Number(i), Value::Object(map)) => map.get(&i.to_string()),
                _ => None,
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            f.write_str("$")
        } else {
            f.write_str(&self.raw)
        }
    }
}

fn parse_part(part: &str, segments: &mut Vec<Segment>) -> Result<(), String> {
    if part.is_empty() {
        return Err("empty segment".to_string());
    }

    let (name, mut brackets) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if !name.is_empty() {
        if name.contains(']') {
            return Err(format!("unexpected ']' in '{}'", part));
        }
        segments.push(match name.parse::<usize>() {
            Ok(n) => Segment::Number(n),
            Err(_) => Segment::Key(name.to_string()),
        });
    }

    while !brackets.is_empty() {
        let inner_end = brackets
            .find(']')
            .ok_or_else(|| format!("unclosed '[' in '{}'", part))?;
        if !brackets.starts_with('[') {
            return Err(format!("unexpected text in '{}'", part));
        }
        let index = brackets[1..inner_end]
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("array index must be a number in '{}'", part))?;
        segments.push(Segment::Index(index));
        brackets = &brackets[inner_end + 1..];
    }

    Ok(())
}

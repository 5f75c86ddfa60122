// ABOUTME: Decodes the JSON environment payload passed to the grader container
// ABOUTME: Accepts either an object map or a list of KEY=VALUE strings

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{GradeError, Result};

/// Parse the caller-supplied environment payload into an ordered map.
pub fn parse_environment(payload: &str) -> Result<BTreeMap<String, String>> {
    let document: Value = serde_json::from_str(payload)
        .map_err(|e| GradeError::InvalidEnvironment(e.to_string()))?;

    match document {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| scalar_to_string(&key, value).map(|value| (key, value)))
            .collect(),
        Value::Array(entries) => entries.into_iter().map(split_assignment).collect(),
        other => Err(GradeError::InvalidEnvironment(format!(
            "expected an object or a list of KEY=VALUE strings, got {}",
            kind(&other)
        ))),
    }
}

/// Render environment variables in the KEY=VALUE form the runtime expects
pub fn to_assignments(environment: &BTreeMap<String, String>) -> Vec<String> {
    environment
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect()
}

fn scalar_to_string(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(GradeError::InvalidEnvironment(format!(
            "value for {} must be a scalar, got {}",
            key,
            kind(&other)
        ))),
    }
}

fn split_assignment(entry: Value) -> Result<(String, String)> {
    let Value::String(entry) = entry else {
        return Err(GradeError::InvalidEnvironment(format!(
            "list entries must be KEY=VALUE strings, got {}",
            kind(&entry)
        )));
    };

    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(GradeError::InvalidEnvironment(format!(
            "{:?} is not a KEY=VALUE assignment",
            entry
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! # Raw Request Parameters
//!
//! Key → JSON value map that both the query-string and the JSON-body
//! surfaces reduce to. A key seen once in a query string becomes a string;
//! a repeated key becomes an array of strings.

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::{ValidationError, ValidationResult};

/// Unvalidated request parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    values: BTreeMap<String, Value>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from decoded query-string pairs, preserving repeats
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key, value);
        }
        params
    }

    /// Builds parameters from a JSON object body
    pub fn from_json(body: Value) -> ValidationResult<Self> {
        match body {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            Value::Null => Ok(Self::new()),
            other => Err(ValidationError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Sets a key, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = Value::String(value.into());
        match self.values.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    /// First present key among `names`, with the key that matched
    pub fn lookup<'a>(&'a self, names: &[&'a str]) -> Option<(&'a str, &'a Value)> {
        names
            .iter()
            .find_map(|name| self.values.get(*name).map(|value| (*name, value)))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

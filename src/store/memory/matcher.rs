//! Query document evaluation for the in-memory engine
//!
//! Supports the operator subset the planner emits: equality (null also
//! matches a missing field), `$gt/$gte/$lt/$lte` within one type bracket,
//! `$in`, `$elemMatch`, `$or` and `$and`. Array fields match when the
//! whole array or any element satisfies the condition. Anything else is
//! rejected rather than silently ignored.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::model::RecordId;
use crate::store::errors::{StoreError, StoreResult};
use crate::store::path::collect_path;

use super::sorter::{compare_values, same_bracket};

/// Evaluates query documents against stored documents
pub struct QueryMatcher;

impl QueryMatcher {
    /// Checks if a document matches every clause of the query (AND semantics)
    pub fn matches(document: &Value, query: &Value) -> StoreResult<bool> {
        let Value::Object(clauses) = query else {
            return Err(StoreError::Rejected(format!(
                "query must be an object, got {}",
                query
            )));
        };

        for (key, condition) in clauses {
            let matched = match key.as_str() {
                "$or" => Self::any_of(document, condition)?,
                "$and" => Self::all_of(document, condition)?,
                op if op.starts_with('$') => {
                    return Err(StoreError::Rejected(format!(
                        "unsupported top-level operator '{}'",
                        op
                    )))
                }
                path => Self::matches_field(document, path, condition)?,
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn any_of(document: &Value, branches: &Value) -> StoreResult<bool> {
        for branch in Self::branches(branches)? {
            if Self::matches(document, branch)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn all_of(document: &Value, branches: &Value) -> StoreResult<bool> {
        for branch in Self::branches(branches)? {
            if !Self::matches(document, branch)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn branches(value: &Value) -> StoreResult<&Vec<Value>> {
        value
            .as_array()
            .ok_or_else(|| StoreError::Rejected(format!("expected array of clauses, got {}", value)))
    }

    fn matches_field(document: &Value, path: &str, condition: &Value) -> StoreResult<bool> {
        let raw = collect_path(document, path);

        let Some(operators) = operator_map(condition) else {
            return Ok(Self::eq_match(&raw, condition));
        };

        for (op, operand) in operators {
            let matched = match op.as_str() {
                "$eq" => Self::eq_match(&raw, operand),
                "$gt" => Self::compare_match(&raw, operand, |o| o == Ordering::Greater),
                "$gte" => Self::compare_match(&raw, operand, |o| o != Ordering::Less),
                "$lt" => Self::compare_match(&raw, operand, |o| o == Ordering::Less),
                "$lte" => Self::compare_match(&raw, operand, |o| o != Ordering::Greater),
                "$in" => {
                    let members = operand.as_array().ok_or_else(|| {
                        StoreError::Rejected(format!("$in needs an array, got {}", operand))
                    })?;
                    members.iter().any(|member| Self::eq_match(&raw, member))
                }
                "$elemMatch" => Self::elem_match(&raw, operand)?,
                other => {
                    return Err(StoreError::Rejected(format!(
                        "unsupported operator '{}' on '{}'",
                        other, path
                    )))
                }
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Exact equality; null matches missing
    fn eq_match(raw: &[&Value], expected: &Value) -> bool {
        if expected.is_null() && raw.is_empty() {
            return true;
        }
        expand(raw)
            .into_iter()
            .any(|actual| values_equal(actual, expected))
    }

    /// Ordered comparison within one type bracket
    fn compare_match(raw: &[&Value], bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        expand(raw).into_iter().any(|actual| {
            same_bracket(Some(actual), Some(bound))
                && !actual.is_null()
                && accept(compare_values(Some(actual), Some(bound)))
        })
    }

    fn elem_match(raw: &[&Value], nested: &Value) -> StoreResult<bool> {
        for value in raw {
            if let Value::Array(items) = value {
                for item in items {
                    if item.is_object() && Self::matches(item, nested)? {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

/// `{"$gt": 1, ...}` → operator map; `{"$oid": ..}` and plain values are literals
fn operator_map(condition: &Value) -> Option<&Map<String, Value>> {
    let map = condition.as_object()?;
    if map.is_empty() || RecordId::from_document(condition).is_some() {
        return None;
    }
    map.keys().all(|k| k.starts_with('$')).then_some(map)
}

/// Each value plus, for arrays, their elements
fn expand<'a>(raw: &[&'a Value]) -> Vec<&'a Value> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        out.push(*value);
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
    }
    out
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_)) | (Value::Object(_), Value::Object(_)) => {
            if let (Some(a), Some(b)) = (RecordId::from_document(actual), RecordId::from_document(expected)) {
                return a == b;
            }
            if actual.is_number() {
                return compare_values(Some(actual), Some(expected)) == Ordering::Equal;
            }
            actual == expected
        }
        _ => actual == expected,
    }
}

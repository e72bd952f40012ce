//! Aggregation stages for the in-memory engine
//!
//! `$search` scores rows by how often the query terms occur in the
//! searched text fields, orders them by the embedded sort (relevance then
//! `_id` when none is given) and resumes after `searchAfter`. Each row's
//! search-sequence token is the base64 of its JSON sort-key tuple.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{json, Value};

use crate::store::errors::{StoreError, StoreResult};
use crate::store::path::{collect_path, lookup_path, set_path};

use super::matcher::QueryMatcher;
use super::sorter::{ResultSorter, SortKeySpec};
use super::Row;

/// Runs a pipeline over the given rows
pub fn run_pipeline(mut rows: Vec<Row>, pipeline: &[Value]) -> StoreResult<Vec<Row>> {
    for (position, stage) in pipeline.iter().enumerate() {
        let (name, spec) = stage_parts(stage)?;
        rows = match name {
            "$search" if position == 0 => search(rows, spec)?,
            "$search" => {
                return Err(StoreError::Rejected(
                    "$search must be the first stage".to_string(),
                ))
            }
            "$addFields" | "$set" => add_fields(rows, spec)?,
            "$match" => {
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    if QueryMatcher::matches(&row.doc, spec)? {
                        kept.push(row);
                    }
                }
                kept
            }
            "$sort" => {
                let keys = ResultSorter::parse(spec)?;
                ResultSorter::sort(&mut rows, &keys);
                rows
            }
            "$limit" => {
                let limit = spec.as_u64().ok_or_else(|| {
                    StoreError::Rejected(format!("$limit must be a positive integer, got {}", spec))
                })?;
                rows.truncate(limit as usize);
                rows
            }
            other => {
                return Err(StoreError::Rejected(format!(
                    "unsupported pipeline stage '{}'",
                    other
                )))
            }
        };
    }
    Ok(rows)
}

fn stage_parts(stage: &Value) -> StoreResult<(&str, &Value)> {
    let map = stage
        .as_object()
        .filter(|m| m.len() == 1)
        .ok_or_else(|| StoreError::Rejected(format!("malformed stage {}", stage)))?;
    map.iter()
        .next()
        .map(|(name, spec)| (name.as_str(), spec))
        .ok_or_else(|| StoreError::Rejected(format!("malformed stage {}", stage)))
}

fn search(rows: Vec<Row>, spec: &Value) -> StoreResult<Vec<Row>> {
    let text = spec
        .get("text")
        .ok_or_else(|| StoreError::Rejected("$search needs a text operator".to_string()))?;
    let query = text
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Rejected("text.query must be a string".to_string()))?;
    let paths: Vec<&str> = match text.get("path") {
        Some(Value::String(p)) => vec![p.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => return Err(StoreError::Rejected("text.path is required".to_string())),
    };

    let terms = tokenize(query);
    let mut hits: Vec<Row> = rows
        .into_iter()
        .filter_map(|mut row| {
            row.score = relevance(&row.doc, &paths, &terms);
            (row.score > 0.0).then_some(row)
        })
        .collect();

    let default_sort = json!({"score": {"$meta": "searchScore", "order": -1}, "_id": 1});
    let keys = ResultSorter::parse(spec.get("sort").unwrap_or(&default_sort))?;
    ResultSorter::sort(&mut hits, &keys);

    for row in hits.iter_mut() {
        row.sequence = Some(encode_sequence(&sort_tuple(row, &keys))?);
    }

    match spec.get("searchAfter") {
        None => Ok(hits),
        Some(token) => {
            let token = token
                .as_str()
                .ok_or_else(|| StoreError::InvalidToken(token.to_string()))?;
            let after = decode_sequence(token, keys.len())?;
            Ok(hits
                .into_iter()
                .filter(|row| {
                    ResultSorter::compare_tuples(&sort_tuple(row, &keys), &after, &keys)
                        == std::cmp::Ordering::Greater
                })
                .collect())
        }
    }
}

fn add_fields(mut rows: Vec<Row>, spec: &Value) -> StoreResult<Vec<Row>> {
    let fields = spec
        .as_object()
        .ok_or_else(|| StoreError::Rejected(format!("$addFields needs an object, got {}", spec)))?;

    for row in rows.iter_mut() {
        for (name, expr) in fields {
            if let Some(value) = evaluate(row, expr)? {
                set_path(&mut row.doc, name, value);
            }
        }
    }
    Ok(rows)
}

/// Evaluates a projection expression; `None` leaves the field unset
fn evaluate(row: &Row, expr: &Value) -> StoreResult<Option<Value>> {
    if let Some(meta) = expr.get("$meta") {
        return match meta.as_str() {
            Some("searchSequenceToken") => Ok(row.sequence.clone().map(Value::String)),
            Some("searchScore") => Ok(Some(json!(row.score))),
            _ => Err(StoreError::Rejected(format!("unsupported $meta {}", meta))),
        };
    }

    if let Some(args) = expr.get("$arrayElemAt") {
        let (Some(Value::String(reference)), Some(index)) =
            (args.get(0), args.get(1).and_then(Value::as_u64))
        else {
            return Err(StoreError::Rejected(format!("malformed $arrayElemAt {}", args)));
        };
        let path = reference.trim_start_matches('$');
        let values = collect_path(&row.doc, path);
        let element = match values.as_slice() {
            [Value::Array(items)] => items.get(index as usize),
            many => many.get(index as usize).copied(),
        };
        return Ok(element.cloned());
    }

    match expr {
        Value::String(reference) if reference.starts_with('$') => {
            Ok(lookup_path(&row.doc, &reference[1..]).cloned())
        }
        literal => Ok(Some(literal.clone())),
    }
}

/// Occurrences of query terms in the searched fields
fn relevance(doc: &Value, paths: &[&str], terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let words: Vec<String> = paths
        .iter()
        .flat_map(|path| collect_path(doc, path))
        .filter_map(Value::as_str)
        .flat_map(tokenize)
        .collect();

    terms
        .iter()
        .map(|term| words.iter().filter(|w| *w == term).count())
        .sum::<usize>() as f64
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn sort_tuple(row: &Row, keys: &[SortKeySpec]) -> Vec<Value> {
    keys.iter().map(|k| k.value_of(row)).collect()
}

fn encode_sequence(tuple: &[Value]) -> StoreResult<String> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(tuple)?))
}

fn decode_sequence(token: &str, arity: usize) -> StoreResult<Vec<Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StoreError::InvalidToken(token.to_string()))?;
    let tuple: Vec<Value> =
        serde_json::from_slice(&bytes).map_err(|_| StoreError::InvalidToken(token.to_string()))?;
    if tuple.len() != arity {
        return Err(StoreError::InvalidToken(token.to_string()));
    }
    Ok(tuple)
}

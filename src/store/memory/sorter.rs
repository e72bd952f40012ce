//! Row ordering for the in-memory engine
//!
//! Values compare in BSON bracket order:
//! missing/null < number < string < object < array < ObjectId < bool.
//! Numbers compare by value regardless of integer or float encoding.

use std::cmp::Ordering;

use serde_json::Value;

use crate::model::RecordId;
use crate::planner::RELEVANCE_KEY;
use crate::store::errors::{StoreError, StoreResult};
use crate::store::path::lookup_path;

use super::Row;

/// What a sort key reads
#[derive(Debug, Clone, PartialEq)]
pub enum SortTarget {
    Field(String),
    /// Search relevance of the row
    Score,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKeySpec {
    pub target: SortTarget,
    pub descending: bool,
}

impl SortKeySpec {
    pub fn value_of(&self, row: &Row) -> Value {
        match &self.target {
            SortTarget::Field(path) => lookup_path(&row.doc, path).cloned().unwrap_or(Value::Null),
            SortTarget::Score => serde_json::Number::from_f64(row.score)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Parses a sort document: `{field: ±1}` or `{score: {$meta: "searchScore", order: ±1}}`
    pub fn parse(sort: &Value) -> StoreResult<Vec<SortKeySpec>> {
        let Value::Object(keys) = sort else {
            return Err(StoreError::Rejected(format!("sort must be an object, got {}", sort)));
        };

        keys.iter()
            .map(|(field, spec)| {
                if let Some(meta) = spec.get("$meta") {
                    if meta != "searchScore" || field != RELEVANCE_KEY {
                        return Err(StoreError::Rejected(format!(
                            "unsupported sort meta on '{}': {}",
                            field, meta
                        )));
                    }
                    let order = spec.get("order").and_then(Value::as_i64).unwrap_or(-1);
                    return Ok(SortKeySpec {
                        target: SortTarget::Score,
                        descending: order < 0,
                    });
                }

                match spec.as_i64() {
                    Some(1) => Ok(SortKeySpec {
                        target: SortTarget::Field(field.clone()),
                        descending: false,
                    }),
                    Some(-1) => Ok(SortKeySpec {
                        target: SortTarget::Field(field.clone()),
                        descending: true,
                    }),
                    _ => Err(StoreError::Rejected(format!(
                        "invalid sort direction for '{}': {}",
                        field, spec
                    ))),
                }
            })
            .collect()
    }

    /// Sorts rows according to the keys.
    ///
    /// Sort is stable and deterministic.
    pub fn sort(rows: &mut [Row], keys: &[SortKeySpec]) {
        rows.sort_by(|a, b| Self::compare_rows(a, b, keys));
    }

    pub fn compare_rows(a: &Row, b: &Row, keys: &[SortKeySpec]) -> Ordering {
        Self::compare_tuples(
            &keys.iter().map(|k| k.value_of(a)).collect::<Vec<_>>(),
            &keys.iter().map(|k| k.value_of(b)).collect::<Vec<_>>(),
            keys,
        )
    }

    /// Compares two sort-key tuples under the given directions
    pub fn compare_tuples(a: &[Value], b: &[Value], keys: &[SortKeySpec]) -> Ordering {
        for ((key, a_val), b_val) in keys.iter().zip(a).zip(b) {
            let ordering = compare_values(Some(a_val), Some(b_val));
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(v @ Value::Object(_)) if RecordId::from_document(v).is_some() => 5,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 6,
    }
}

/// True when both values fall in the same comparison bracket
pub fn same_bracket(a: Option<&Value>, b: Option<&Value>) -> bool {
    type_rank(a) == type_rank(b)
}

/// Compares two values in bracket order
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a_rank, b_rank) = (type_rank(a), type_rank(b));
    if a_rank != b_rank {
        return a_rank.cmp(&b_rank);
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            match (RecordId::from_document(x), RecordId::from_document(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            }
        }
        _ => Ordering::Equal, // null, arrays and plain objects tie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, doc: Value) -> Row {
        let mut doc = doc;
        doc["_id"] = json!({"$oid": id});
        Row::new(doc)
    }

    const A: &str = "000000000000000000000001";
    const B: &str = "000000000000000000000002";
    const C: &str = "000000000000000000000003";

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.doc["_id"]["$oid"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_bracket_order() {
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(null)), None), Ordering::Equal);
        assert_eq!(compare_values(Some(&json!(5)), Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(2.0))), Ordering::Equal);
        assert_eq!(compare_values(Some(&json!(1.5)), Some(&json!(2))), Ordering::Less);
    }

    #[test]
    fn test_object_ids_compare_by_bytes() {
        assert_eq!(
            compare_values(Some(&json!({"$oid": A})), Some(&json!({"$oid": B}))),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_descending_with_tie_break() {
        let mut rows = vec![
            row(C, json!({"views": 5})),
            row(A, json!({"views": 5})),
            row(B, json!({"views": 9})),
        ];
        let keys = ResultSorter::parse(&json!({"views": -1, "_id": 1})).unwrap();
        ResultSorter::sort(&mut rows, &keys);
        assert_eq!(ids(&rows), vec![B, A, C]);
    }

    #[test]
    fn test_missing_sorts_lowest() {
        let mut rows = vec![
            row(A, json!({"rating": {"average": 3}})),
            row(B, json!({"rating": {"average": null}})),
            row(C, json!({})),
        ];
        let keys = ResultSorter::parse(&json!({"rating.average": 1, "_id": 1})).unwrap();
        ResultSorter::sort(&mut rows, &keys);
        assert_eq!(ids(&rows), vec![B, C, A]);
    }

    #[test]
    fn test_score_key() {
        let mut low = row(A, json!({}));
        low.score = 1.0;
        let mut high = row(B, json!({}));
        high.score = 2.0;
        let mut rows = vec![low, high];

        let keys = ResultSorter::parse(&json!({
            "score": {"$meta": "searchScore", "order": -1},
            "_id": 1
        }))
        .unwrap();
        ResultSorter::sort(&mut rows, &keys);
        assert_eq!(ids(&rows), vec![B, A]);
    }

    #[test]
    fn test_invalid_direction_rejected() {
        assert!(ResultSorter::parse(&json!({"views": 2})).is_err());
        assert!(ResultSorter::parse(&json!(["views"])).is_err());
    }
}

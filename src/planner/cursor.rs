//! Cursor codec
//!
//! Compound continuation tokens have the form `sortField:lastValue:rowId`,
//! where `lastValue` is the literal `null` when the previous row had no
//! value for the field. Decoding folds the token into the predicate as a
//! disjunction with a row-identifier tie-break.
//!
//! The clause shape depends only on (search active, last value null,
//! direction); see [`clause_shape`].

use serde_json::{json, Number, Value};

use crate::model::{RecordId, SortField};
use crate::store::lookup_path;

use super::ast::{Predicate, SortDirection};
use super::compiler::fields;
use super::errors::{PlannerError, PlannerResult};

/// Literal written for an absent sort value
pub const NULL_LITERAL: &str = "null";

/// Decoded compound continuation token
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundCursor {
    pub field: SortField,
    pub last_value: Option<Number>,
    pub row_id: RecordId,
}

impl CompoundCursor {
    pub fn new(field: SortField, last_value: Option<Number>, row_id: RecordId) -> Self {
        Self {
            field,
            last_value,
            row_id,
        }
    }

    /// Serializes to `sortField:lastValue:rowId`
    pub fn encode(&self) -> String {
        let value = self
            .last_value
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_else(|| NULL_LITERAL.to_string());
        format!("{}:{}:{}", self.field, value, self.row_id)
    }

    /// Parses a compound token
    pub fn decode(token: &str) -> PlannerResult<Self> {
        let mut parts = token.splitn(3, ':');
        let (Some(field), Some(value), Some(row_id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PlannerError::invalid_token(
                token,
                "expected sortField:lastValue:rowId",
            ));
        };

        let field = SortField::parse(field).ok_or_else(|| {
            PlannerError::invalid_token(token, format!("unknown sort field '{}'", field))
        })?;

        let last_value = if value == NULL_LITERAL {
            None
        } else {
            let number = value.parse::<Number>().map_err(|_| {
                PlannerError::invalid_token(token, format!("'{}' is not a number", value))
            })?;
            Some(number)
        };

        let row_id = RecordId::parse(row_id)
            .map_err(|e| PlannerError::invalid_token(token, e.to_string()))?;

        Ok(Self {
            field,
            last_value,
            row_id,
        })
    }

    /// Decodes and checks the token was minted for `expected`
    pub fn decode_for(token: &str, expected: SortField) -> PlannerResult<Self> {
        let cursor = Self::decode(token)?;
        if cursor.field != expected {
            return Err(PlannerError::sort_mismatch(
                token,
                expected.as_str(),
                cursor.field.as_str(),
            ));
        }
        Ok(cursor)
    }

    /// Builds the outbound cursor from the last row of a page. The value is
    /// read from the stored path (calories: first nutrient amount).
    pub fn from_document(field: SortField, document: &Value) -> Option<Self> {
        let row_id = document
            .get(fields::ROW_ID)
            .and_then(RecordId::from_document)?;
        let last_value = match lookup_path(document, field.stored_path()) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };
        Some(Self::new(field, last_value, row_id))
    }
}

/// How the "strictly beyond" branch of a cursor clause is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeyondBranch {
    /// Compare against the last value in the active direction
    Strict,
    /// Nulls sort lowest; the next boundary is the first value above zero
    FromZero,
    /// Nothing sorts below null going down
    Omitted,
}

/// Shape of the clause folded in for a compound cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseShape {
    /// Path the clause compares on
    pub path: &'static str,
    pub beyond: BeyondBranch,
}

/// (search active, last value null, direction) → clause shape
pub fn clause_shape(
    field: SortField,
    has_query: bool,
    is_null: bool,
    direction: SortDirection,
) -> ClauseShape {
    let path = if has_query {
        field.search_path()
    } else {
        field.stored_path()
    };

    let beyond = match (is_null, direction) {
        (false, _) => BeyondBranch::Strict,
        (true, SortDirection::Asc) => BeyondBranch::FromZero,
        (true, SortDirection::Desc) => BeyondBranch::Omitted,
    };

    ClauseShape { path, beyond }
}

/// Disjunction resuming strictly after (lastValue, rowId)
pub fn cursor_clause(
    cursor: &CompoundCursor,
    has_query: bool,
    direction: SortDirection,
) -> Vec<Vec<Predicate>> {
    let shape = clause_shape(
        cursor.field,
        has_query,
        cursor.last_value.is_none(),
        direction,
    );

    let last = cursor
        .last_value
        .as_ref()
        .map(|n| Value::Number(n.clone()))
        .unwrap_or(Value::Null);

    let beyond = match shape.beyond {
        BeyondBranch::Strict => Some(match direction {
            SortDirection::Asc => Predicate::gt(shape.path, last.clone()),
            SortDirection::Desc => Predicate::lt(shape.path, last.clone()),
        }),
        BeyondBranch::FromZero => Some(Predicate::gt(shape.path, json!(0))),
        BeyondBranch::Omitted => None,
    };

    let tie = vec![
        Predicate::eq(shape.path, last),
        after_row(&cursor.row_id),
    ];

    beyond.map(|b| vec![b]).into_iter().chain([tie]).collect()
}

/// Strict forward-only pagination by insertion order
pub fn after_row(row_id: &RecordId) -> Predicate {
    Predicate::gt(fields::ROW_ID, row_id.to_document())
}

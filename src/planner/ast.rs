//! Predicate and sort structures
//!
//! Store-agnostic logical AND of field conditions, rendered to the
//! document-store query language only at the edge ([`Condition::to_document`]).

use serde_json::{json, Map, Value};

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value (null also matches a missing field)
    Eq(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Less than: field < value
    Lt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Both sides of a range in one condition
    Range { gte: Option<Value>, lte: Option<Value> },
    /// Field value is in the set (or, for arrays, shares a member with it)
    In(Vec<Value>),
    /// Some element of an array field satisfies every nested predicate
    ElemMatch(Vec<Predicate>),
}

impl FilterOp {
    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::Gt(_) => "gt",
            FilterOp::Gte(_) => "gte",
            FilterOp::Lt(_) => "lt",
            FilterOp::Lte(_) => "lte",
            FilterOp::Range { .. } => "range",
            FilterOp::In(_) => "in",
            FilterOp::ElemMatch(_) => "elemMatch",
        }
    }

    fn to_document(&self) -> Value {
        match self {
            FilterOp::Eq(v) => v.clone(),
            FilterOp::Gt(v) => json!({ "$gt": v }),
            FilterOp::Gte(v) => json!({ "$gte": v }),
            FilterOp::Lt(v) => json!({ "$lt": v }),
            FilterOp::Lte(v) => json!({ "$lte": v }),
            FilterOp::Range { gte, lte } => {
                let mut range = Map::new();
                if let Some(v) = gte {
                    range.insert("$gte".into(), v.clone());
                }
                if let Some(v) = lte {
                    range.insert("$lte".into(), v.clone());
                }
                Value::Object(range)
            }
            FilterOp::In(values) => json!({ "$in": values }),
            FilterOp::ElemMatch(nested) => {
                json!({ "$elemMatch": Value::Object(predicates_to_map(nested)) })
            }
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field path (dotted)
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq(value))
    }

    /// Create a range predicate (gt)
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gt(value))
    }

    /// Create a range predicate (gte)
    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gte(value))
    }

    /// Create a range predicate (lt)
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lt(value))
    }

    /// Create a set-membership predicate
    pub fn in_set(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOp::In(values))
    }
}

fn predicates_to_map(predicates: &[Predicate]) -> Map<String, Value> {
    predicates
        .iter()
        .map(|p| (p.field.clone(), p.op.to_document()))
        .collect()
}

/// One top-level clause of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Plain field predicate
    Field(Predicate),
    /// Disjunction of conjunctions
    AnyOf(Vec<Vec<Predicate>>),
}

/// Conjunction of clauses (all must hold)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    pub clauses: Vec<Clause>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.clauses.push(Clause::Field(predicate));
    }

    pub fn push_any_of(&mut self, branches: Vec<Vec<Predicate>>) {
        self.clauses.push(Clause::AnyOf(branches));
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Renders to a query document
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for clause in &self.clauses {
            match clause {
                Clause::Field(p) => {
                    doc.insert(p.field.clone(), p.op.to_document());
                }
                Clause::AnyOf(branches) => {
                    let rendered: Vec<Value> = branches
                        .iter()
                        .map(|branch| Value::Object(predicates_to_map(branch)))
                        .collect();
                    doc.insert("$or".into(), Value::Array(rendered));
                }
            }
        }
        Value::Object(doc)
    }

    /// One line per clause, for explain output
    pub fn describe(&self) -> Vec<String> {
        self.clauses
            .iter()
            .map(|clause| match clause {
                Clause::Field(p) => format!("{} {} {}", p.field, p.op.op_name(), p.op.to_document()),
                Clause::AnyOf(branches) => format!("any of {} branches", branches.len()),
            })
            .collect()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Numeric form used by sort documents
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Stored or materialized field
    Field {
        field: String,
        direction: SortDirection,
    },
    /// Search relevance score, always descending
    Relevance,
}

/// Field name the relevance key renders under inside a search stage
pub const RELEVANCE_KEY: &str = "score";

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push(SortKey::Field {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.field(field, SortDirection::Asc)
    }

    pub fn relevance(mut self) -> Self {
        self.keys.push(SortKey::Relevance);
        self
    }

    pub fn has_relevance(&self) -> bool {
        self.keys.iter().any(|k| matches!(k, SortKey::Relevance))
    }

    /// Renders to a sort document; relevance becomes a `$meta` reference
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for key in &self.keys {
            match key {
                SortKey::Field { field, direction } => {
                    doc.insert(field.clone(), json!(direction.as_i32()));
                }
                SortKey::Relevance => {
                    doc.insert(
                        RELEVANCE_KEY.into(),
                        json!({ "$meta": "searchScore", "order": -1 }),
                    );
                }
            }
        }
        Value::Object(doc)
    }

    /// Human-readable form for explain output
    pub fn describe(&self) -> String {
        self.keys
            .iter()
            .map(|key| match key {
                SortKey::Field { field, direction } => format!("{} {}", field, direction.as_str()),
                SortKey::Relevance => "relevance desc".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_rendering() {
        let mut condition = Condition::new();
        condition.push(Predicate::eq("isVegan", json!(true)));
        condition.push(Predicate::in_set("culture", vec![json!("Greek")]));

        assert_eq!(
            condition.to_document(),
            json!({"isVegan": true, "culture": {"$in": ["Greek"]}})
        );
    }

    #[test]
    fn test_range_renders_single_condition() {
        let op = FilterOp::Range {
            gte: Some(json!(0)),
            lte: Some(json!(500)),
        };
        let mut condition = Condition::new();
        condition.push(Predicate::new(
            "nutrients",
            FilterOp::ElemMatch(vec![
                Predicate::eq("name", json!("Calories")),
                Predicate::new("amount", op),
            ]),
        ));

        assert_eq!(
            condition.to_document(),
            json!({"nutrients": {"$elemMatch": {
                "name": "Calories",
                "amount": {"$gte": 0, "$lte": 500}
            }}})
        );
    }

    #[test]
    fn test_any_of_rendering() {
        let mut condition = Condition::new();
        condition.push_any_of(vec![
            vec![Predicate::gt("views", json!(3))],
            vec![Predicate::eq("views", json!(3)), Predicate::gt("_id", json!("x"))],
        ]);

        assert_eq!(
            condition.to_document(),
            json!({"$or": [{"views": {"$gt": 3}}, {"views": 3, "_id": {"$gt": "x"}}]})
        );
    }

    #[test]
    fn test_sort_rendering() {
        let spec = SortSpec::new()
            .field("rating.average", SortDirection::Desc)
            .relevance()
            .asc("_id");

        assert_eq!(
            spec.to_document(),
            json!({
                "rating.average": -1,
                "score": {"$meta": "searchScore", "order": -1},
                "_id": 1
            })
        );
        assert!(spec.has_relevance());
        assert_eq!(spec.describe(), "rating.average desc, relevance desc, _id asc");
    }

    #[test]
    fn test_empty_condition() {
        assert!(Condition::new().is_empty());
        assert_eq!(Condition::new().to_document(), json!({}));
    }
}

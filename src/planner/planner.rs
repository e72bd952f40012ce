//! Query planner
//!
//! Resolves the execution path once per request and produces an immutable
//! plan: a plain find, or a search pipeline with optional match and sort
//! stages. Planning never touches the store.
//!
//! Cursor shape (decided here, honored by the executor):
//!
//! | query | sort           | inbound token        | outbound token   |
//! |-------|----------------|----------------------|------------------|
//! | no    | none           | `_id > id`           | none             |
//! | no    | field          | compound `$or`       | compound         |
//! | yes   | none           | `searchAfter`        | search sequence  |
//! | yes   | calories       | compound `$or`       | compound         |
//! | yes   | rating / views | `searchAfter`        | search sequence  |

use serde_json::{json, Map, Value};

use crate::filter::Filter;
use crate::model::{RecordId, SortField, MATERIALIZED_CALORIES};

use super::ast::{Condition, SortDirection, SortSpec};
use super::compiler::{compile_predicate, fields};
use super::cursor::{after_row, cursor_clause, CompoundCursor};
use super::errors::{PlannerError, PlannerResult};
use super::sort::{compile_sort, SortPlacement};

/// Hard cap on documents returned per request
pub const DEFAULT_RESULT_CAP: u64 = 100;

/// Search index name used when none is configured
pub const DEFAULT_SEARCH_INDEX: &str = "recipes";

/// Text fields the search stage matches against
pub const SEARCH_PATHS: [&str; 2] = ["name", "summary"];

/// Field the search stage projects the resumable position into
pub const PAGINATION_TOKEN_FIELD: &str = "paginationToken";

/// Which continuation token the executor attaches to the last row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundToken {
    /// Clients resume from the last `_id`
    None,
    /// `sortField:lastValue:rowId`
    Compound(SortField),
    /// Opaque store search position
    SearchSequence,
}

impl OutboundToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundToken::None => "none",
            OutboundToken::Compound(_) => "compound",
            OutboundToken::SearchSequence => "search_sequence",
        }
    }
}

/// Plain find: predicate, sort, cap
#[derive(Debug, Clone, PartialEq)]
pub struct FindPlan {
    /// Structured predicate plus any cursor clause
    pub predicate: Condition,
    pub sort: SortSpec,
    pub limit: u64,
    pub outbound: OutboundToken,
}

impl FindPlan {
    pub fn filter_document(&self) -> Value {
        self.predicate.to_document()
    }

    pub fn sort_document(&self) -> Value {
        self.sort.to_document()
    }
}

/// Search pipeline: search, project, optional match, optional sort, cap
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub index: String,
    pub query: String,
    /// Sort evaluated inside the search stage
    pub stage_sort: Option<SortSpec>,
    /// Opaque store position to resume after
    pub search_after: Option<String>,
    /// Project the first nutrient amount as a sortable field
    pub materialize_calories: bool,
    /// Post-search match (structured predicate plus any cursor clause)
    pub predicate: Condition,
    /// Explicit sort stage after the match
    pub post_sort: Option<SortSpec>,
    pub limit: u64,
    pub outbound: OutboundToken,
}

impl SearchPlan {
    /// Renders the aggregation pipeline
    pub fn to_pipeline(&self) -> Vec<Value> {
        let mut stages = Vec::with_capacity(5);

        let mut search = Map::new();
        search.insert("index".into(), json!(self.index));
        search.insert(
            "text".into(),
            json!({ "query": self.query, "path": SEARCH_PATHS }),
        );
        if let Some(sort) = &self.stage_sort {
            search.insert("sort".into(), sort.to_document());
        }
        if let Some(after) = &self.search_after {
            search.insert("searchAfter".into(), json!(after));
        }
        stages.push(json!({ "$search": Value::Object(search) }));

        let mut projected = Map::new();
        projected.insert(
            PAGINATION_TOKEN_FIELD.into(),
            json!({ "$meta": "searchSequenceToken" }),
        );
        if self.materialize_calories {
            projected.insert(
                MATERIALIZED_CALORIES.into(),
                json!({ "$arrayElemAt": [
                    format!("${}.{}", fields::NUTRIENTS, fields::NUTRIENT_AMOUNT),
                    0
                ] }),
            );
        }
        stages.push(json!({ "$addFields": Value::Object(projected) }));

        if !self.predicate.is_empty() {
            stages.push(json!({ "$match": self.predicate.to_document() }));
        }

        if let Some(sort) = &self.post_sort {
            stages.push(json!({ "$sort": sort.to_document() }));
        }

        stages.push(json!({ "$limit": self.limit }));
        stages
    }
}

/// Immutable plan, resolved once per request
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Find(FindPlan),
    Search(SearchPlan),
}

impl QueryPlan {
    pub fn outbound(&self) -> OutboundToken {
        match self {
            QueryPlan::Find(plan) => plan.outbound,
            QueryPlan::Search(plan) => plan.outbound,
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            QueryPlan::Find(plan) => plan.limit,
            QueryPlan::Search(plan) => plan.limit,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, QueryPlan::Search(_))
    }

    pub fn path_name(&self) -> &'static str {
        match self {
            QueryPlan::Find(_) => "find",
            QueryPlan::Search(_) => "search",
        }
    }
}

/// Query planner that produces deterministic plans
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    result_cap: u64,
    search_index: String,
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_CAP, DEFAULT_SEARCH_INDEX)
    }
}

impl QueryPlanner {
    /// Creates a new planner
    pub fn new(result_cap: u64, search_index: impl Into<String>) -> Self {
        Self {
            result_cap,
            search_index: search_index.into(),
        }
    }

    pub fn result_cap(&self) -> u64 {
        self.result_cap
    }

    /// Plans a filter, returning an immutable plan or error.
    ///
    /// This method is deterministic: same inputs → same plan.
    pub fn plan(&self, filter: &Filter) -> PlannerResult<QueryPlan> {
        match filter.query.as_deref() {
            None => self.plan_find(filter).map(QueryPlan::Find),
            Some(query) => self.plan_search(filter, query).map(QueryPlan::Search),
        }
    }

    fn plan_find(&self, filter: &Filter) -> PlannerResult<FindPlan> {
        let mut predicate = compile_predicate(filter);
        let compiled = compile_sort(filter);
        let direction = SortDirection::from_ascending(filter.is_ascending());

        let outbound = match filter.sort {
            None => {
                if let Some(token) = filter.token.as_deref() {
                    let row_id = RecordId::parse(token)
                        .map_err(|e| PlannerError::invalid_token(token, e.to_string()))?;
                    predicate.push(after_row(&row_id));
                }
                OutboundToken::None
            }
            Some(field) => {
                if let Some(token) = filter.token.as_deref() {
                    let cursor = CompoundCursor::decode_for(token, field)?;
                    predicate.push_any_of(cursor_clause(&cursor, false, direction));
                }
                OutboundToken::Compound(field)
            }
        };

        Ok(FindPlan {
            predicate,
            sort: compiled.spec,
            limit: self.result_cap,
            outbound,
        })
    }

    fn plan_search(&self, filter: &Filter, query: &str) -> PlannerResult<SearchPlan> {
        let mut predicate = compile_predicate(filter);
        let compiled = compile_sort(filter);
        let direction = SortDirection::from_ascending(filter.is_ascending());

        let mut plan = SearchPlan {
            index: self.search_index.clone(),
            query: query.to_string(),
            stage_sort: None,
            search_after: None,
            materialize_calories: false,
            predicate: Condition::new(),
            post_sort: None,
            limit: self.result_cap,
            outbound: OutboundToken::SearchSequence,
        };

        match compiled.placement {
            SortPlacement::PostSearch => {
                // Only calories reads from an array position
                let field = filter.sort.unwrap_or(SortField::Calories);
                if let Some(token) = filter.token.as_deref() {
                    let cursor = CompoundCursor::decode_for(token, field)?;
                    predicate.push_any_of(cursor_clause(&cursor, true, direction));
                }
                plan.materialize_calories = true;
                plan.post_sort = Some(compiled.spec);
                plan.outbound = OutboundToken::Compound(field);
            }
            SortPlacement::SearchStage | SortPlacement::Find => {
                plan.stage_sort = Some(compiled.spec);
                plan.search_after = filter.token.clone();
            }
        }

        plan.predicate = predicate;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlannerErrorCode;

    const ROW: &str = "65a1f0c2b3d4e5f60718293a";

    fn planner() -> QueryPlanner {
        QueryPlanner::default()
    }

    fn find(plan: QueryPlan) -> FindPlan {
        match plan {
            QueryPlan::Find(p) => p,
            other => panic!("expected find plan, got {}", other.path_name()),
        }
    }

    fn search(plan: QueryPlan) -> SearchPlan {
        match plan {
            QueryPlan::Search(p) => p,
            other => panic!("expected search plan, got {}", other.path_name()),
        }
    }

    #[test]
    fn test_sustainable_find_plan() {
        let filter = Filter {
            sustainable: Some(true),
            ..Default::default()
        };
        let plan = find(planner().plan(&filter).unwrap());

        assert_eq!(plan.filter_document(), json!({"isSustainable": true}));
        assert_eq!(plan.sort_document(), json!({"_id": 1}));
        assert_eq!(plan.limit, 100);
        assert_eq!(plan.outbound, OutboundToken::None);
    }

    #[test]
    fn test_bare_token_resumes_after_row() {
        let filter = Filter::default().with_token(ROW);
        let plan = find(planner().plan(&filter).unwrap());
        assert_eq!(
            plan.filter_document(),
            json!({"_id": {"$gt": {"$oid": ROW}}})
        );
    }

    #[test]
    fn test_find_with_sort_uses_compound_cursor() {
        let filter = Filter {
            vegan: Some(true),
            ..Default::default()
        }
        .with_sort(SortField::Rating, false)
        .with_token(format!("rating:4.5:{ROW}"));
        let plan = find(planner().plan(&filter).unwrap());

        assert_eq!(
            plan.filter_document(),
            json!({
                "isVegan": true,
                "$or": [
                    {"rating.average": {"$lt": 4.5}},
                    {"rating.average": 4.5, "_id": {"$gt": {"$oid": ROW}}}
                ]
            })
        );
        assert_eq!(plan.outbound, OutboundToken::Compound(SortField::Rating));
    }

    #[test]
    fn test_bare_token_with_sort_rejected() {
        let filter = Filter::default()
            .with_sort(SortField::Views, false)
            .with_token(ROW);
        let err = planner().plan(&filter).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::RecipeTokenInvalid);
        assert_eq!(err.token(), ROW);
    }

    #[test]
    fn test_search_without_sort() {
        let filter = Filter::default().with_query("tacos").with_token("opaque==");
        let plan = search(planner().plan(&filter).unwrap());

        assert_eq!(
            plan.to_pipeline(),
            vec![
                json!({"$search": {
                    "index": "recipes",
                    "text": {"query": "tacos", "path": ["name", "summary"]},
                    "sort": {"score": {"$meta": "searchScore", "order": -1}, "_id": 1},
                    "searchAfter": "opaque=="
                }}),
                json!({"$addFields": {"paginationToken": {"$meta": "searchSequenceToken"}}}),
                json!({"$limit": 100}),
            ]
        );
        assert_eq!(plan.outbound, OutboundToken::SearchSequence);
    }

    #[test]
    fn test_search_sorted_by_views_stays_in_stage() {
        let filter = Filter {
            cheap: Some(true),
            ..Default::default()
        }
        .with_query("soup")
        .with_sort(SortField::Views, true);
        let plan = search(planner().plan(&filter).unwrap());

        assert!(!plan.materialize_calories);
        assert!(plan.post_sort.is_none());
        assert_eq!(
            plan.stage_sort.as_ref().map(|s| s.describe()),
            Some("views asc, relevance desc, _id asc".to_string())
        );
        let pipeline = plan.to_pipeline();
        assert_eq!(pipeline.len(), 4);
        assert_eq!(pipeline[2], json!({"$match": {"isCheap": true}}));
    }

    #[test]
    fn test_search_calories_null_cursor() {
        let filter = Filter::default()
            .with_query("tacos")
            .with_sort(SortField::Calories, true)
            .with_token(format!("calories:null:{ROW}"));
        let plan = search(planner().plan(&filter).unwrap());

        assert_eq!(
            plan.to_pipeline(),
            vec![
                json!({"$search": {
                    "index": "recipes",
                    "text": {"query": "tacos", "path": ["name", "summary"]}
                }}),
                json!({"$addFields": {
                    "paginationToken": {"$meta": "searchSequenceToken"},
                    "calories": {"$arrayElemAt": ["$nutrients.amount", 0]}
                }}),
                json!({"$match": {"$or": [
                    {"calories": {"$gt": 0}},
                    {"calories": null, "_id": {"$gt": {"$oid": ROW}}}
                ]}}),
                json!({"$sort": {"calories": 1, "_id": 1}}),
                json!({"$limit": 100}),
            ]
        );
        assert_eq!(plan.outbound, OutboundToken::Compound(SortField::Calories));
    }

    #[test]
    fn test_calories_token_for_other_sort_rejected() {
        let filter = Filter::default()
            .with_query("tacos")
            .with_sort(SortField::Calories, false)
            .with_token(format!("views:3:{ROW}"));
        let err = planner().plan(&filter).unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::RecipeTokenSortMismatch);
    }

    #[test]
    fn test_result_cap_is_configurable() {
        let plan = QueryPlanner::new(25, "idx").plan(&Filter::default()).unwrap();
        assert_eq!(plan.limit(), 25);
        assert!(!plan.is_search());
    }

    #[test]
    fn test_deterministic_planning() {
        let filter = Filter::default()
            .with_query("curry")
            .with_sort(SortField::Rating, false);
        let plan1 = planner().plan(&filter).unwrap();
        let plan2 = planner().plan(&filter).unwrap();
        assert_eq!(plan1, plan2);
    }
}

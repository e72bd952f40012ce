//! Query executor
//!
//! Runs one request as a small state machine:
//!
//! `determine-path` → `compile` → `execute` → `paginate-append` → `done`
//!
//! with `failed` reachable from `compile` (token errors) and `execute`
//! (store errors). The path is chosen once and never changes mid-flight.
//! No retries happen here.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::filter::{Filter, RawParams};
use crate::model::RecipeHit;
use crate::planner::{CompoundCursor, OutboundToken, QueryPlan, QueryPlanner, PAGINATION_TOKEN_FIELD};
use crate::store::{FindRequest, RecipeStore, StoreError};

use super::errors::{QueryError, QueryResult};

/// Stage of a single query request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    DeterminePath,
    Compile,
    Execute,
    PaginateAppend,
    Done,
}

impl ExecutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStage::DeterminePath => "determine-path",
            ExecutionStage::Compile => "compile",
            ExecutionStage::Execute => "execute",
            ExecutionStage::PaginateAppend => "paginate-append",
            ExecutionStage::Done => "done",
        }
    }
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query executor over an explicitly passed store handle
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn RecipeStore>,
    planner: QueryPlanner,
}

impl QueryExecutor {
    /// Creates a new executor
    pub fn new(store: Arc<dyn RecipeStore>, planner: QueryPlanner) -> Self {
        Self { store, planner }
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    pub(super) fn store(&self) -> &dyn RecipeStore {
        self.store.as_ref()
    }

    /// Validates raw parameters, then runs the query
    pub async fn query(&self, params: &RawParams) -> QueryResult<Vec<RecipeHit>> {
        let filter = Filter::parse(params)?;
        self.execute(&filter).await
    }

    /// Runs a validated filter and returns the ordered page.
    ///
    /// Only the last row may carry a `token`.
    pub async fn execute(&self, filter: &Filter) -> QueryResult<Vec<RecipeHit>> {
        let mut stage = ExecutionStage::DeterminePath;
        debug!(%stage, search = filter.has_query(), sort = ?filter.sort);

        stage = ExecutionStage::Compile;
        let plan = self.planner.plan(filter).map_err(|e| {
            debug!(%stage, code = e.code().code(), token = e.token(), "cursor rejected");
            QueryError::from(e)
        })?;

        stage = ExecutionStage::Execute;
        debug!(%stage, path = plan.path_name(), limit = plan.limit());
        let documents = self
            .run(&plan)
            .await
            .map_err(|e| self.fail(stage, e))?;

        stage = ExecutionStage::PaginateAppend;
        let hits = paginate(&plan, documents).map_err(|e| self.fail(stage, e))?;

        stage = ExecutionStage::Done;
        debug!(%stage, returned = hits.len());
        Ok(hits)
    }

    async fn run(&self, plan: &QueryPlan) -> Result<Vec<Value>, StoreError> {
        match plan {
            QueryPlan::Find(find) => {
                let request = FindRequest {
                    filter: find.filter_document(),
                    sort: find.sort_document(),
                    limit: find.limit,
                };
                self.store.find(&request).await
            }
            QueryPlan::Search(search) => self.store.aggregate(&search.to_pipeline()).await,
        }
    }

    /// Logs and classifies a store failure
    pub(super) fn fail(&self, stage: ExecutionStage, err: StoreError) -> QueryError {
        if err.is_invalid_token() {
            debug!(%stage, backend = self.store.backend_name(), error = %err, "store rejected token");
        } else {
            error!(
                %stage,
                backend = self.store.backend_name(),
                code = err.code(),
                error = %err,
                "store request failed"
            );
        }
        QueryError::from(err)
    }
}

/// Converts store documents into hits and attaches the outbound token to
/// the last row
fn paginate(plan: &QueryPlan, mut documents: Vec<Value>) -> Result<Vec<RecipeHit>, StoreError> {
    let sequence_tokens: Vec<Option<String>> = documents
        .iter_mut()
        .map(|doc| {
            doc.as_object_mut()
                .and_then(|map| map.remove(PAGINATION_TOKEN_FIELD))
                .and_then(|token| token.as_str().map(str::to_string))
        })
        .collect();

    let outbound = match (plan.outbound(), documents.last()) {
        (_, None) | (OutboundToken::None, _) => None,
        (OutboundToken::Compound(field), Some(last)) => {
            CompoundCursor::from_document(field, last).map(|cursor| cursor.encode())
        }
        (OutboundToken::SearchSequence, Some(_)) => sequence_tokens.last().cloned().flatten(),
    };

    let mut hits = documents
        .into_iter()
        .map(|doc| RecipeHit::from_document(doc).map_err(StoreError::from))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(last) = hits.last_mut() {
        last.token = outbound;
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Nutrient, Rating, Recipe, SortField};
    use crate::store::{InMemoryStore, UpsertOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store and counts query round trips
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        queries: AtomicUsize,
    }

    impl CountingStore {
        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecipeStore for CountingStore {
        fn backend_name(&self) -> &'static str {
            "counting"
        }

        async fn find(&self, request: &FindRequest) -> Result<Vec<Value>, StoreError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.find(request).await
        }

        async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.aggregate(pipeline).await
        }

        async fn get_by_external_id(&self, id: u64) -> Result<Option<Value>, StoreError> {
            self.inner.get_by_external_id(id).await
        }

        async fn upsert_recipe(&self, recipe: &Recipe) -> Result<UpsertOutcome, StoreError> {
            self.inner.upsert_recipe(recipe).await
        }

        async fn increment_views(&self, id: u64) -> Result<Option<u64>, StoreError> {
            self.inner.increment_views(id).await
        }

        async fn record_rating(&self, id: u64, stars: u8) -> Result<Option<Rating>, StoreError> {
            self.inner.record_rating(id, stars).await
        }
    }

    fn recipe(id: u64, name: &str, calories: f64, views: u64) -> Recipe {
        let mut recipe = Recipe::new(id, name);
        recipe.summary = format!("{} for dinner", name);
        recipe.nutrients = vec![Nutrient::calories(calories)];
        recipe.views = views;
        recipe
    }

    async fn executor() -> QueryExecutor {
        let store = InMemoryStore::with_recipes([
            recipe(1, "Fish tacos", 300.0, 0),
            recipe(2, "Bean soup", 250.0, 0),
            recipe(3, "Taco salad", 410.0, 0),
        ])
        .unwrap();
        for id in [1, 1, 3] {
            store_views(&store, id).await;
        }
        QueryExecutor::new(Arc::new(store), QueryPlanner::default())
    }

    async fn store_views(store: &InMemoryStore, id: u64) {
        store.increment_views(id).await.unwrap();
    }

    fn ids(hits: &[RecipeHit]) -> Vec<u64> {
        hits.iter().map(|h| h.recipe.id).collect()
    }

    #[tokio::test]
    async fn test_default_order_is_insertion_order() {
        let hits = executor().await.execute(&Filter::default()).await.unwrap();
        assert_eq!(ids(&hits), vec![1, 2, 3]);
        assert!(hits.iter().all(|h| h.token.is_none()));
    }

    #[tokio::test]
    async fn test_sorted_page_carries_compound_token_on_last_row() {
        let filter = Filter::default().with_sort(SortField::Views, false);
        let hits = executor().await.execute(&filter).await.unwrap();

        assert_eq!(ids(&hits), vec![1, 3, 2]);
        assert!(hits[0].token.is_none());
        assert!(hits[1].token.is_none());
        let token = hits[2].token.as_deref().unwrap();
        assert!(token.starts_with("views:0:"));
    }

    #[tokio::test]
    async fn test_search_page_carries_sequence_token() {
        let filter = Filter::default().with_query("tacos");
        let hits = executor().await.execute(&filter).await.unwrap();

        assert_eq!(ids(&hits), vec![1]);
        assert!(hits[0].token.is_some());
        let value = serde_json::to_value(&hits[0]).unwrap();
        assert!(value.get("paginationToken").is_none());
    }

    #[tokio::test]
    async fn test_empty_page_has_no_token() {
        let filter = Filter::default().with_query("lasagna");
        assert!(executor().await.execute(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_spice_level_rejected_before_store() {
        let store = Arc::new(CountingStore::default());
        let executor = QueryExecutor::new(store.clone(), QueryPlanner::default());

        let params = RawParams::new().with("spiceLevel", "hot");
        let err = executor.query(&params).await.unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
        assert_eq!(err.to_string(), "Unknown spice level received: hot");
        assert_eq!(store.queries(), 0);

        executor.query(&RawParams::new().with("vegan", true)).await.unwrap();
        assert_eq!(store.queries(), 1);
    }

    #[tokio::test]
    async fn test_rejected_cursor_never_reaches_store() {
        let store = Arc::new(CountingStore::default());
        let executor = QueryExecutor::new(store.clone(), QueryPlanner::default());

        let filter = Filter::default()
            .with_sort(SortField::Rating, false)
            .with_token("views:3:65a1f0c2b3d4e5f60718293a");
        let err = executor.execute(&filter).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidToken { .. }));
        assert_eq!(store.queries(), 0);
    }

    #[tokio::test]
    async fn test_malformed_search_token_is_invalid_token() {
        let filter = Filter::default().with_query("tacos").with_token("%%%");
        let err = executor().await.execute(&filter).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidToken { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_paginate_strips_pagination_token() {
        let plan = QueryPlanner::default()
            .plan(&Filter::default().with_query("soup"))
            .unwrap();
        let docs = vec![
            json!({"id": 1, "name": "A", "paginationToken": "t1"}),
            json!({"id": 2, "name": "B", "paginationToken": "t2"}),
        ];
        let hits = paginate(&plan, docs).unwrap();
        assert_eq!(hits[0].token, None);
        assert_eq!(hits[1].token.as_deref(), Some("t2"));
    }
}

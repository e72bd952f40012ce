//! Storage collaborator
//!
//! The executor talks to the document store only through [`RecipeStore`]:
//! find with filter/sort/limit documents, aggregate with a pipeline, and
//! the handful of per-recipe mutations. Two backends implement it:
//!
//! - [`InMemoryStore`]: evaluates the query subset locally
//! - [`DataApiStore`]: MongoDB Atlas Data API over HTTP

mod data_api;
mod errors;
mod memory;
mod path;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::{Rating, Recipe};

pub use data_api::{DataApiConfig, DataApiStore};
pub use errors::{StoreError, StoreResult};
pub use memory::{InMemoryStore, QueryMatcher};
pub use path::{collect_path, lookup_path};

/// Plain find request, already rendered to query documents
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    pub filter: Value,
    pub sort: Value,
    pub limit: u64,
}

/// Result of an upsert keyed by external id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

impl UpsertOutcome {
    pub fn created(&self) -> bool {
        matches!(self, UpsertOutcome::Created)
    }
}

/// Document store holding the recipe collection
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Value>>;

    async fn aggregate(&self, pipeline: &[Value]) -> StoreResult<Vec<Value>>;

    async fn get_by_external_id(&self, id: u64) -> StoreResult<Option<Value>>;

    /// Insert or replace by external id
    async fn upsert_recipe(&self, recipe: &Recipe) -> StoreResult<UpsertOutcome>;

    /// Atomically bumps `views`; `None` when the recipe does not exist
    async fn increment_views(&self, id: u64) -> StoreResult<Option<u64>>;

    /// Folds one rating into the running average; `None` when the recipe does not exist
    async fn record_rating(&self, id: u64, stars: u8) -> StoreResult<Option<Rating>>;
}

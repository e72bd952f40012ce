//! In-memory recipe store
//!
//! Keeps documents in insertion order and evaluates the same query and
//! pipeline documents the Data API backend would receive. Used for local
//! serving from a seed file and as the fake behind executor tests.

mod matcher;
mod pipeline;
mod sorter;

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::model::{Rating, Recipe, RecordId};
use crate::planner::fields;

use super::errors::{StoreError, StoreResult};
use super::{FindRequest, RecipeStore, UpsertOutcome};

pub use matcher::QueryMatcher;

/// A document moving through the engine, with its search metadata
#[derive(Debug, Clone)]
pub struct Row {
    pub doc: Value,
    pub score: f64,
    pub sequence: Option<String>,
}

impl Row {
    pub fn new(doc: Value) -> Self {
        Self {
            doc,
            score: 0.0,
            sequence: None,
        }
    }
}

/// Recipe store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<Vec<Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store by upserting each recipe in order
    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> StoreResult<Self> {
        let store = Self::new();
        {
            let mut documents = store.write()?;
            for recipe in recipes {
                upsert_into(&mut documents, &recipe)?;
            }
        }
        Ok(store)
    }

    /// Loads a JSON array of recipes
    pub fn from_seed_file(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        let recipes: Vec<Recipe> = serde_json::from_slice(&bytes)?;
        Self::with_recipes(recipes)
    }

    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<Value>>> {
        self.documents
            .read()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<Value>>> {
        self.documents
            .write()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".to_string()))
    }

    fn rows(&self) -> StoreResult<Vec<Row>> {
        Ok(self.read()?.iter().cloned().map(Row::new).collect())
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Value>> {
        let pipeline = [
            json!({ "$match": request.filter }),
            json!({ "$sort": request.sort }),
            json!({ "$limit": request.limit }),
        ];
        self.aggregate(&pipeline).await
    }

    async fn aggregate(&self, pipeline: &[Value]) -> StoreResult<Vec<Value>> {
        let rows = pipeline::run_pipeline(self.rows()?, pipeline)?;
        Ok(rows.into_iter().map(|row| row.doc).collect())
    }

    async fn get_by_external_id(&self, id: u64) -> StoreResult<Option<Value>> {
        let documents = self.read()?;
        Ok(documents.iter().find(|doc| has_external_id(doc, id)).cloned())
    }

    async fn upsert_recipe(&self, recipe: &Recipe) -> StoreResult<UpsertOutcome> {
        let mut documents = self.write()?;
        upsert_into(&mut documents, recipe)
    }

    async fn increment_views(&self, id: u64) -> StoreResult<Option<u64>> {
        let mut documents = self.write()?;
        let Some(doc) = documents.iter_mut().find(|doc| has_external_id(doc, id)) else {
            return Ok(None);
        };
        let views = doc.get("views").and_then(Value::as_u64).unwrap_or(0) + 1;
        doc["views"] = json!(views);
        Ok(Some(views))
    }

    async fn record_rating(&self, id: u64, stars: u8) -> StoreResult<Option<Rating>> {
        let mut documents = self.write()?;
        let Some(doc) = documents.iter_mut().find(|doc| has_external_id(doc, id)) else {
            return Ok(None);
        };
        let current: Rating = match doc.get("rating") {
            Some(rating) => serde_json::from_value(rating.clone())?,
            None => Rating::default(),
        };
        let updated = current.with_rating(stars);
        doc["rating"] = serde_json::to_value(&updated)?;
        Ok(Some(updated))
    }
}

fn has_external_id(doc: &Value, id: u64) -> bool {
    doc.get("id").and_then(Value::as_u64) == Some(id)
}

/// New rows get a fresh `_id` and zeroed counters; replacements keep them
fn upsert_into(documents: &mut Vec<Value>, recipe: &Recipe) -> StoreResult<UpsertOutcome> {
    let mut doc = serde_json::to_value(recipe)?;

    match documents.iter_mut().find(|d| has_external_id(d, recipe.id)) {
        Some(existing) => {
            for kept in [fields::ROW_ID, "views", "rating"] {
                if let Some(value) = existing.get(kept) {
                    doc[kept] = value.clone();
                }
            }
            *existing = doc;
            Ok(UpsertOutcome::Replaced)
        }
        None => {
            doc[fields::ROW_ID] = RecordId::generate().to_document();
            doc["views"] = json!(0);
            doc["rating"] = serde_json::to_value(Rating::default())?;
            documents.push(doc);
            Ok(UpsertOutcome::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Nutrient;

    fn recipe(id: u64, name: &str, calories: f64) -> Recipe {
        let mut recipe = Recipe::new(id, name);
        recipe.nutrients = vec![Nutrient::calories(calories)];
        recipe
    }

    #[tokio::test]
    async fn test_upsert_assigns_row_id_and_counters() {
        let store = InMemoryStore::new();
        let mut input = recipe(7, "Pho", 450.0);
        input.views = 99;

        assert_eq!(store.upsert_recipe(&input).await.unwrap(), UpsertOutcome::Created);
        let doc = store.get_by_external_id(7).await.unwrap().unwrap();
        assert!(RecordId::from_document(&doc["_id"]).is_some());
        assert_eq!(doc["views"], json!(0));
        assert_eq!(doc["rating"], json!({"average": null, "count": 0}));
    }

    #[tokio::test]
    async fn test_replace_keeps_identity_and_counters() {
        let store = InMemoryStore::with_recipes([recipe(7, "Pho", 450.0)]).unwrap();
        store.increment_views(7).await.unwrap();
        store.record_rating(7, 4).await.unwrap();
        let before = store.get_by_external_id(7).await.unwrap().unwrap();

        let outcome = store.upsert_recipe(&recipe(7, "Pho ga", 430.0)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(store.len(), 1);

        let after = store.get_by_external_id(7).await.unwrap().unwrap();
        assert_eq!(after["_id"], before["_id"]);
        assert_eq!(after["name"], json!("Pho ga"));
        assert_eq!(after["views"], json!(1));
        assert_eq!(after["rating"]["count"], json!(1));
    }

    #[tokio::test]
    async fn test_counters_on_unknown_recipe() {
        let store = InMemoryStore::new();
        assert_eq!(store.increment_views(1).await.unwrap(), None);
        assert_eq!(store.record_rating(1, 5).await.unwrap(), None);
        assert_eq!(store.get_by_external_id(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_caps() {
        let store = InMemoryStore::with_recipes([
            recipe(1, "A", 300.0),
            recipe(2, "B", 100.0),
            recipe(3, "C", 200.0),
        ])
        .unwrap();

        let docs = store
            .find(&FindRequest {
                filter: json!({"nutrients.0.amount": {"$gte": 150}}),
                sort: json!({"nutrients.0.amount": 1, "_id": 1}),
                limit: 1,
            })
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], json!(3));
    }
}

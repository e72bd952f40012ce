//! Per-recipe operations: lookup, ingestion upsert, view and rating counters

use tracing::info;

use crate::filter::ValidationError;
use crate::model::{Rating, Recipe};
use crate::store::UpsertOutcome;

use super::errors::{QueryError, QueryResult};
use super::executor::{ExecutionStage, QueryExecutor};

/// Accepted star range for a single rating
pub const STARS_RANGE: (i64, i64) = (1, 5);

impl QueryExecutor {
    /// Single recipe by external id
    pub async fn get_recipe(&self, id: u64) -> QueryResult<Recipe> {
        let doc = self
            .store()
            .get_by_external_id(id)
            .await
            .map_err(|e| self.fail(ExecutionStage::Execute, e))?
            .ok_or(QueryError::NotFound(id))?;
        serde_json::from_value(doc)
            .map_err(|e| self.fail(ExecutionStage::Execute, e.into()))
    }

    /// Insert or replace by external id
    pub async fn upsert_recipe(&self, recipe: &Recipe) -> QueryResult<UpsertOutcome> {
        let outcome = self
            .store()
            .upsert_recipe(recipe)
            .await
            .map_err(|e| self.fail(ExecutionStage::Execute, e))?;
        info!(id = recipe.id, created = outcome.created(), "recipe upserted");
        Ok(outcome)
    }

    /// Bumps the view counter, returning the new count
    pub async fn record_view(&self, id: u64) -> QueryResult<u64> {
        self.store()
            .increment_views(id)
            .await
            .map_err(|e| self.fail(ExecutionStage::Execute, e))?
            .ok_or(QueryError::NotFound(id))
    }

    /// Folds one rating of 1 to 5 stars into the recipe's average
    pub async fn rate_recipe(&self, id: u64, stars: i64) -> QueryResult<Rating> {
        let (min, max) = STARS_RANGE;
        if stars < min {
            return Err(ValidationError::BelowMinimum {
                param: "stars".to_string(),
                min: min as f64,
            }
            .into());
        }
        if stars > max {
            return Err(ValidationError::AboveMaximum {
                param: "stars".to_string(),
                max: max as f64,
            }
            .into());
        }

        let rating = self
            .store()
            .record_rating(id, stars as u8)
            .await
            .map_err(|e| self.fail(ExecutionStage::Execute, e))?
            .ok_or(QueryError::NotFound(id))?;
        info!(id, stars, count = rating.count, "rating recorded");
        Ok(rating)
    }
}

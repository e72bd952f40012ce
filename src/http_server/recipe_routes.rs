//! Recipe HTTP Routes
//!
//! Query, lookup, ingestion and counter endpoints over the executor.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::QueryExecutor;
use crate::filter::RawParams;
use crate::model::{Rating, Recipe, RecipeHit};

use super::errors::ApiError;

// ==================
// Shared State
// ==================

/// Recipe state shared across handlers
pub struct RecipeState {
    pub executor: QueryExecutor,
}

impl RecipeState {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub stars: i64,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: u64,
}

// ==================
// Recipe Routes
// ==================

/// Create recipe routes
pub fn recipe_routes(state: Arc<RecipeState>) -> Router {
    Router::new()
        .route("/recipes", get(list_recipes_handler).put(upsert_recipe_handler))
        .route("/recipes/search", post(search_recipes_handler))
        .route("/recipes/:id", get(get_recipe_handler))
        .route("/recipes/:id/views", post(record_view_handler))
        .route("/recipes/:id/ratings", post(rate_recipe_handler))
        .with_state(state)
}

fn recipe_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::malformed(e.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::malformed(e.body_text()))
}

// ==================
// Handlers
// ==================

async fn list_recipes_handler(
    State(state): State<Arc<RecipeState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<RecipeHit>>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::malformed(e.body_text()))?;
    let params = RawParams::from_pairs(pairs);
    Ok(Json(state.executor.query(&params).await?))
}

async fn search_recipes_handler(
    State(state): State<Arc<RecipeState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<RecipeHit>>, ApiError> {
    let params = RawParams::from_json(json_body(body)?).map_err(|e| ApiError(e.into()))?;
    Ok(Json(state.executor.query(&params).await?))
}

async fn get_recipe_handler(
    State(state): State<Arc<RecipeState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let id = recipe_id(path)?;
    Ok(Json(state.executor.get_recipe(id).await?))
}

async fn upsert_recipe_handler(
    State(state): State<Arc<RecipeState>>,
    body: Result<Json<Recipe>, JsonRejection>,
) -> Result<Json<UpsertResponse>, ApiError> {
    let recipe = json_body(body)?;
    let outcome = state.executor.upsert_recipe(&recipe).await?;
    Ok(Json(UpsertResponse {
        created: outcome.created(),
    }))
}

async fn record_view_handler(
    State(state): State<Arc<RecipeState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<ViewsResponse>, ApiError> {
    let id = recipe_id(path)?;
    let views = state.executor.record_view(id).await?;
    Ok(Json(ViewsResponse { views }))
}

async fn rate_recipe_handler(
    State(state): State<Arc<RecipeState>>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<Rating>, ApiError> {
    let id = recipe_id(path)?;
    let request = json_body(body)?;
    Ok(Json(state.executor.rate_recipe(id, request.stars).await?))
}

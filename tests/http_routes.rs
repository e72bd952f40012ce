//! HTTP Route Tests
//!
//! Drives the full router (CORS and trace layers included) with
//! `tower::ServiceExt::oneshot`:
//! - Status mapping for validation, token, not-found errors
//! - Query string and JSON body filters reach the same executor
//! - Counter and upsert endpoints

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use recipe_catalog::executor::QueryExecutor;
use recipe_catalog::http_server::{HttpServer, HttpServerConfig};
use recipe_catalog::model::{Nutrient, Recipe};
use recipe_catalog::planner::QueryPlanner;
use recipe_catalog::store::InMemoryStore;

// =============================================================================
// Helper Functions
// =============================================================================

fn recipe(id: u64, name: &str, calories: f64, vegan: bool) -> Recipe {
    let mut recipe = Recipe::new(id, name);
    recipe.is_vegan = vegan;
    recipe.nutrients = vec![Nutrient::calories(calories)];
    recipe
}

fn router() -> Router {
    let store = InMemoryStore::with_recipes(vec![
        recipe(1, "Tofu stir fry", 420.0, true),
        recipe(2, "Beef stew", 640.0, false),
        recipe(3, "Chickpea stew", 380.0, true),
    ])
    .unwrap();
    let executor = QueryExecutor::new(Arc::new(store), QueryPlanner::new(2, "recipes"));
    HttpServer::new(HttpServerConfig::default(), executor).router()
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Query Endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send(router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_with_query_string() {
    let (status, body) = send(
        router(),
        Method::GET,
        "/recipes?vegan=true&sort=calories&asc=true",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Chickpea stew", "Tofu stir fry"]);
    assert!(body[0].get("token").is_none());
    assert!(body[1]["token"].as_str().unwrap().starts_with("calories:420"));
}

#[tokio::test]
async fn test_repeated_keys_form_enum_sets() {
    let (status, body) = send(
        router(),
        Method::GET,
        "/recipes?spiceLevels=mild&spiceLevels=spicy",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_with_json_body() {
    let (status, body) = send(
        router(),
        Method::POST,
        "/recipes/search",
        Some(json!({"query": "stew", "maxCals": 500})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Chickpea stew"]);
    assert!(body[0]["token"].is_string());
}

#[tokio::test]
async fn test_validation_error_is_bad_request() {
    let (status, body) = send(router(), Method::GET, "/recipes?rating=7", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "rating must be <= 5");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_unknown_cuisine_is_bad_request() {
    let (status, body) = send(router(), Method::GET, "/recipes?cultures=Martian", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Martian"));
}

#[tokio::test]
async fn test_malformed_search_token_is_bad_request() {
    let (status, body) = send(
        router(),
        Method::POST,
        "/recipes/search",
        Some(json!({"query": "stew", "token": "%%%not-a-token"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("%%%not-a-token"));
}

#[tokio::test]
async fn test_non_object_body_is_bad_request() {
    let (status, _) = send(router(), Method::POST, "/recipes/search", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Record Endpoints
// =============================================================================

#[tokio::test]
async fn test_get_recipe_and_not_found() {
    let (status, body) = send(router(), Method::GET, "/recipes/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Beef stew");

    let (status, body) = send(router(), Method::GET, "/recipes/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_views_and_ratings() {
    let router = router();

    let (status, body) = send(router.clone(), Method::POST, "/recipes/1/views", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views"], 1);

    let (status, body) = send(
        router.clone(),
        Method::POST,
        "/recipes/1/ratings",
        Some(json!({"stars": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["average"], 4.0);

    let (status, _) = send(
        router,
        Method::POST,
        "/recipes/1/ratings",
        Some(json!({"stars": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upsert_creates_then_replaces() {
    let router = router();
    let body = serde_json::to_value(recipe(10, "Dal", 350.0, true)).unwrap();

    let (status, created) = send(router.clone(), Method::PUT, "/recipes", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["created"], true);

    let (_, replaced) = send(router.clone(), Method::PUT, "/recipes", Some(body)).await;
    assert_eq!(replaced["created"], false);

    let (_, fetched) = send(router, Method::GET, "/recipes/10", None).await;
    assert_eq!(fetched["name"], "Dal");
}

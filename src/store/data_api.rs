//! MongoDB Atlas Data API backend
//!
//! Every operation is one POST to `{url}/action/{name}` carrying the
//! data source, database and collection. Request bodies are Extended JSON
//! so row identifiers travel as `{"$oid": ..}`. Responses are requested as
//! plain JSON; any numeric wrappers that still arrive (`$numberInt`,
//! `$numberLong`, `$numberDouble`, `$numberDecimal`) are unwrapped before
//! documents reach the recipe model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::model::{Rating, Recipe};
use crate::planner::fields;

use super::errors::{StoreError, StoreResult};
use super::{FindRequest, RecipeStore, UpsertOutcome};

const EJSON: &str = "application/ejson";
const JSON: &str = "application/json";

/// Connection settings for the Data API
#[derive(Debug, Clone, PartialEq)]
pub struct DataApiConfig {
    /// e.g. https://data.mongodb-api.com/app/<app-id>/endpoint/data/v1
    pub url: String,
    pub api_key: String,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Namespace<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    document: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    matched_count: u64,
    #[serde(default)]
    upserted_id: Option<Value>,
}

/// Recipe store backed by the Atlas Data API
pub struct DataApiStore {
    config: DataApiConfig,
    client: Client,
}

impl DataApiStore {
    pub fn new(config: DataApiConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn build_url(&self, action: &str) -> String {
        format!("{}/action/{}", self.config.url.trim_end_matches('/'), action)
    }

    /// Merges the namespace into the action body
    fn body(&self, fields: Value) -> Value {
        let mut body = match serde_json::to_value(Namespace {
            data_source: &self.config.data_source,
            database: &self.config.database,
            collection: &self.config.collection,
        }) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Value::Object(extra) = fields {
            body.extend(extra);
        }
        Value::Object(body)
    }

    async fn api_request<R: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        fields: Value,
        search_after: Option<&str>,
    ) -> StoreResult<R> {
        let response = self
            .client
            .post(self.build_url(action))
            .header("api-key", &self.config.api_key)
            .header(CONTENT_TYPE, EJSON)
            .header(ACCEPT, JSON)
            .json(&self.body(fields))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Data API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_failure(status, &body, search_after));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("cannot parse Data API response: {}", e)))?;
        serde_json::from_value(relax_numbers(raw))
            .map_err(|e| StoreError::Malformed(format!("unexpected Data API response: {}", e)))
    }
}

/// Replaces canonical Extended JSON number wrappers with plain numbers.
/// Other wrappers such as `$oid` are left for the model to read.
pub fn relax_numbers(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(relax_numbers).collect()),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((key, Value::String(text))) = map.iter().next() {
                    if let Some(number) = unwrap_number(key, text) {
                        return number;
                    }
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, inner)| (key, relax_numbers(inner)))
                    .collect(),
            )
        }
        other => other,
    }
}

fn unwrap_number(key: &str, text: &str) -> Option<Value> {
    match key {
        "$numberInt" | "$numberLong" => text.parse::<i64>().ok().map(Value::from),
        // Non-finite doubles have no JSON form
        "$numberDouble" | "$numberDecimal" => Some(
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map_or(Value::Null, Value::Number),
        ),
        _ => None,
    }
}

/// Full replacement for an upsert: the incoming recipe plus the counters
/// the store owns, carried over from the existing row when there is one
fn replacement_document(recipe: &Recipe, existing: Option<&Value>) -> StoreResult<Value> {
    let mut replacement = serde_json::to_value(recipe)?;
    let Value::Object(map) = &mut replacement else {
        return Err(StoreError::Malformed("recipe did not serialize to an object".into()));
    };
    map.remove(fields::ROW_ID);

    let views = existing
        .and_then(|doc| doc.get("views"))
        .cloned()
        .unwrap_or_else(|| json!(0));
    let rating = match existing.and_then(|doc| doc.get("rating")) {
        Some(rating) => rating.clone(),
        None => serde_json::to_value(Rating::default())?,
    };
    map.insert("views".into(), views);
    map.insert("rating".into(), rating);
    Ok(replacement)
}

/// Maps a failed response onto the store taxonomy
fn classify_failure(status: StatusCode, body: &str, search_after: Option<&str>) -> StoreError {
    let lowered = body.to_lowercase();
    if let Some(token) = search_after {
        if status == StatusCode::BAD_REQUEST
            && (lowered.contains("searchafter") || lowered.contains("token"))
        {
            warn!(status = status.as_u16(), "Data API rejected search position");
            return StoreError::InvalidToken(token.to_string());
        }
    }

    let message = format!("Data API error {}: {}", status.as_u16(), body);
    if status.is_client_error() {
        StoreError::Rejected(message)
    } else {
        StoreError::Unavailable(message)
    }
}

/// `searchAfter` of the leading search stage, if any
fn search_after_of(pipeline: &[Value]) -> Option<&str> {
    pipeline
        .first()?
        .get("$search")?
        .get("searchAfter")?
        .as_str()
}

#[async_trait]
impl RecipeStore for DataApiStore {
    fn backend_name(&self) -> &'static str {
        "data_api"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Value>> {
        let response: DocumentsResponse = self
            .api_request(
                "find",
                json!({
                    "filter": request.filter,
                    "sort": request.sort,
                    "limit": request.limit,
                }),
                None,
            )
            .await?;
        Ok(response.documents)
    }

    async fn aggregate(&self, pipeline: &[Value]) -> StoreResult<Vec<Value>> {
        let response: DocumentsResponse = self
            .api_request(
                "aggregate",
                json!({ "pipeline": pipeline }),
                search_after_of(pipeline),
            )
            .await?;
        Ok(response.documents)
    }

    async fn get_by_external_id(&self, id: u64) -> StoreResult<Option<Value>> {
        let response: DocumentResponse = self
            .api_request("findOne", json!({ "filter": { "id": id } }), None)
            .await?;
        Ok(response.document)
    }

    /// `replaceOne` drops fields the incoming recipe no longer carries while
    /// keeping `_id`. Counters are read first, so a view landing between
    /// the read and the replace is lost.
    async fn upsert_recipe(&self, recipe: &Recipe) -> StoreResult<UpsertOutcome> {
        let existing = self.get_by_external_id(recipe.id).await?;
        let replacement = replacement_document(recipe, existing.as_ref())?;

        let response: UpdateResponse = self
            .api_request(
                "replaceOne",
                json!({
                    "filter": { "id": recipe.id },
                    "replacement": replacement,
                    "upsert": true,
                }),
                None,
            )
            .await?;

        Ok(match response.upserted_id {
            Some(_) => UpsertOutcome::Created,
            None => UpsertOutcome::Replaced,
        })
    }

    async fn increment_views(&self, id: u64) -> StoreResult<Option<u64>> {
        let response: UpdateResponse = self
            .api_request(
                "updateOne",
                json!({ "filter": { "id": id }, "update": { "$inc": { "views": 1 } } }),
                None,
            )
            .await?;
        if response.matched_count == 0 {
            return Ok(None);
        }

        let doc = self.get_by_external_id(id).await?;
        Ok(doc.and_then(|d| d.get("views").and_then(Value::as_u64)))
    }

    async fn record_rating(&self, id: u64, stars: u8) -> StoreResult<Option<Rating>> {
        let count = json!({ "$ifNull": ["$rating.count", 0] });
        let average = json!({ "$ifNull": ["$rating.average", 0] });
        let update = json!([{ "$set": {
            "rating.average": { "$divide": [
                { "$add": [{ "$multiply": [average, count] }, stars] },
                { "$add": [count, 1] }
            ] },
            "rating.count": { "$add": [count, 1] }
        } }]);

        let response: UpdateResponse = self
            .api_request(
                "updateOne",
                json!({ "filter": { "id": id }, "update": update }),
                None,
            )
            .await?;
        if response.matched_count == 0 {
            return Ok(None);
        }

        match self.get_by_external_id(id).await? {
            Some(doc) => {
                let rating = doc.get("rating").cloned().unwrap_or(Value::Null);
                Ok(Some(serde_json::from_value(rating)?))
            }
            None => Ok(None),
        }
    }
}

//! # HTTP Server Module
//!
//! axum server exposing the query executor.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /recipes` - Filtered, sorted, paginated recipes (query string)
//! - `POST /recipes/search` - Same, with a JSON filter body
//! - `GET /recipes/:id` - Single recipe
//! - `PUT /recipes` - Upsert by external id
//! - `POST /recipes/:id/views` - Count a view
//! - `POST /recipes/:id/ratings` - Rate 1 to 5 stars

pub mod config;
pub mod errors;
pub mod health_routes;
pub mod recipe_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use server::HttpServer;

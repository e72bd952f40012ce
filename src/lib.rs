//! recipe_catalog - filtered, sorted and cursor-paginated recipe queries
//!
//! Request parameters become a validated [`filter::Filter`], the planner
//! compiles it into either a plain find or a full-text search pipeline,
//! and the executor runs that plan against a [`store::RecipeStore`],
//! attaching a continuation token to the last row of each page.

pub mod cli;
pub mod config;
pub mod executor;
pub mod filter;
pub mod http_server;
pub mod model;
pub mod planner;
pub mod store;

//! Query executor subsystem
//!
//! Consumes plans and produces ordered recipe pages against an explicitly
//! passed [`RecipeStore`](crate::store::RecipeStore).
//!
//! # Execution Flow (strict order)
//!
//! 1. Determine path: free-text query ⇒ search, otherwise find
//! 2. Compile predicate, sort and inbound cursor
//! 3. Issue exactly one store call with the result cap
//! 4. Strip store metadata, attach the outbound token to the last row
//!
//! Validation happens before any store call; store failures are logged
//! and surfaced as a generic internal error.

mod errors;
mod executor;
mod mutations;

pub use errors::{QueryError, QueryResult, INTERNAL_ERROR_MESSAGE};
pub use executor::{ExecutionStage, QueryExecutor};
pub use mutations::STARS_RANGE;

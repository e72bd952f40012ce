//! Executor error types
//!
//! Error codes:
//! - RECIPE_PARAM_* (client error, from validation)
//! - RECIPE_TOKEN_INVALID (client error)
//! - RECIPE_NOT_FOUND (client error)
//! - RECIPE_STORE_FAILURE (server error)
//!
//! A failed query returns no recipes, never a truncated list.

use thiserror::Error;

use crate::filter::ValidationError;
use crate::planner::PlannerError;
use crate::store::StoreError;

/// Message returned for any store failure; details stay in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error, try again later";

#[derive(Debug, Error)]
pub enum QueryError {
    /// Bad, out-of-range or unknown-enum input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Continuation token that cannot resume this query; names the token
    #[error("Invalid token '{token}'")]
    InvalidToken { token: String, reason: String },

    /// No recipe with that external id
    #[error("Recipe {0} not found")]
    NotFound(u64),

    /// Any other store failure
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Store(#[source] StoreError),
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation(err) => err.code(),
            QueryError::InvalidToken { .. } => "RECIPE_TOKEN_INVALID",
            QueryError::NotFound(_) => "RECIPE_NOT_FOUND",
            QueryError::Store(_) => "RECIPE_STORE_FAILURE",
        }
    }

    /// Caller-caused; the route answers with a 4xx
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }
}

impl From<PlannerError> for QueryError {
    fn from(err: PlannerError) -> Self {
        QueryError::InvalidToken {
            token: err.token().to_string(),
            reason: err.message().to_string(),
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidToken(token) => QueryError::InvalidToken {
                reason: "rejected by the store".to_string(),
                token,
            },
            other => QueryError::Store(other),
        }
    }
}

/// Result type for executor operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failure_is_generic() {
        let err = QueryError::from(StoreError::Unavailable("connection reset".into()));
        assert_eq!(err.to_string(), "Internal error, try again later");
        assert!(!err.is_client_error());
        assert_eq!(err.code(), "RECIPE_STORE_FAILURE");
    }

    #[test]
    fn test_store_token_rejection_is_client_error() {
        let err = QueryError::from(StoreError::InvalidToken("CQA=".into()));
        assert_eq!(err.to_string(), "Invalid token 'CQA='");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_planner_error_names_token() {
        let err = QueryError::from(PlannerError::invalid_token("x:y", "bad"));
        assert_eq!(err.to_string(), "Invalid token 'x:y'");
        assert_eq!(err.code(), "RECIPE_TOKEN_INVALID");
    }

    #[test]
    fn test_validation_passes_through_verbatim() {
        let err = QueryError::from(ValidationError::UnknownValue {
            label: "spice level",
            value: "hot".into(),
        });
        assert_eq!(err.to_string(), "Unknown spice level received: hot");
        assert_eq!(err.code(), "RECIPE_PARAM_UNKNOWN_VALUE");
    }
}

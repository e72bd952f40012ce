//! Store error types
//!
//! Error codes:
//! - RECIPE_STORE_INVALID_TOKEN (client error)
//! - RECIPE_STORE_UNAVAILABLE (server error)
//! - RECIPE_STORE_REJECTED (server error)
//! - RECIPE_STORE_MALFORMED (server error)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Search resumption position the store cannot decode
    #[error("Invalid token '{0}'")]
    InvalidToken(String),

    /// Transport failure or poisoned in-process state
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store refused the request (unsupported operator, bad stage)
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// A stored document or response could not be decoded
    #[error("malformed store document: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidToken(_) => "RECIPE_STORE_INVALID_TOKEN",
            StoreError::Unavailable(_) => "RECIPE_STORE_UNAVAILABLE",
            StoreError::Rejected(_) => "RECIPE_STORE_REJECTED",
            StoreError::Malformed(_) => "RECIPE_STORE_MALFORMED",
        }
    }

    pub fn is_invalid_token(&self) -> bool {
        matches!(self, StoreError::InvalidToken(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

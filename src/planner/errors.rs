//! Planner error types
//!
//! Error codes:
//! - RECIPE_TOKEN_INVALID (REJECT)
//! - RECIPE_TOKEN_SORT_MISMATCH (REJECT)

use std::fmt;

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Continuation token that cannot be decoded for the active shape
    RecipeTokenInvalid,
    /// Compound token minted for a different sort field
    RecipeTokenSortMismatch,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::RecipeTokenInvalid => "RECIPE_TOKEN_INVALID",
            PlannerErrorCode::RecipeTokenSortMismatch => "RECIPE_TOKEN_SORT_MISMATCH",
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// The offending token
    token: String,
}

impl PlannerError {
    /// Create an invalid token error
    pub fn invalid_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            code: PlannerErrorCode::RecipeTokenInvalid,
            message: format!("Invalid token '{}': {}", token, reason.into()),
            token,
        }
    }

    /// Create a sort mismatch error
    pub fn sort_mismatch(token: impl Into<String>, expected: &str, found: &str) -> Self {
        let token = token.into();
        Self {
            code: PlannerErrorCode::RecipeTokenSortMismatch,
            message: format!(
                "Invalid token '{}': minted for sort '{}', request sorts by '{}'",
                token, found, expected
            ),
            token,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending token
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PlannerErrorCode::RecipeTokenInvalid.code(),
            "RECIPE_TOKEN_INVALID"
        );
        assert_eq!(
            PlannerErrorCode::RecipeTokenSortMismatch.code(),
            "RECIPE_TOKEN_SORT_MISMATCH"
        );
    }

    #[test]
    fn test_error_names_token() {
        let err = PlannerError::invalid_token("garbage", "expected three segments");
        assert_eq!(err.token(), "garbage");
        assert!(err.to_string().contains("garbage"));
        assert!(err.to_string().contains("three segments"));
    }
}

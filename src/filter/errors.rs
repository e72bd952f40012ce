//! Validation errors for filter parameters
//!
//! Always caller-caused and surfaced verbatim as a client error. Raised
//! before any store call is attempted.

use thiserror::Error;

/// Result type for filter construction
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rejected request parameter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Numeric parameter below its lower bound
    #[error("{param} must be >= {min}")]
    BelowMinimum { param: String, min: f64 },

    /// Numeric parameter above its upper bound
    #[error("{param} must be <= {max}")]
    AboveMaximum { param: String, max: f64 },

    /// Numeric parameter that is not a number or numeric text
    #[error("{param} is not numeric")]
    NotNumeric { param: String },

    /// Enum-valued parameter outside its closed vocabulary
    #[error("Unknown {label} received: {value}")]
    UnknownValue { label: &'static str, value: String },

    /// Continuation token that is not a row identifier
    #[error("{param} is not a valid ObjectId")]
    InvalidRecordId { param: String },

    /// Text parameter given as something other than a string
    #[error("{param} must be a string")]
    NotText { param: String },

    /// Request body that is not a JSON object
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::BelowMinimum { .. } | ValidationError::AboveMaximum { .. } => {
                "RECIPE_PARAM_OUT_OF_RANGE"
            }
            ValidationError::NotNumeric { .. } => "RECIPE_PARAM_NOT_NUMERIC",
            ValidationError::UnknownValue { .. } => "RECIPE_PARAM_UNKNOWN_VALUE",
            ValidationError::InvalidRecordId { .. } => "RECIPE_PARAM_INVALID_ID",
            ValidationError::NotText { .. } => "RECIPE_PARAM_NOT_TEXT",
            ValidationError::MalformedPayload(_) => "RECIPE_MALFORMED_PAYLOAD",
        }
    }
}

//! CLI-specific error types
//!
//! All CLI errors are fatal: the binary prints them and exits non-zero.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::QueryError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {}", .0.code(), .0)]
    Config(#[from] ConfigError),

    #[error("RECIPE_CLI_IO_ERROR: {0}")]
    Io(String),

    #[error("RECIPE_CLI_BOOT_FAILED: {0}")]
    BootFailed(String),

    #[error("{}: {}", .0.code(), .0)]
    Query(#[from] QueryError),
}

impl CliError {
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::BootFailed(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Io(_) => "RECIPE_CLI_IO_ERROR",
            Self::BootFailed(_) => "RECIPE_CLI_BOOT_FAILED",
            Self::Query(e) => e.code(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::io_error("Empty input");
        assert_eq!(err.to_string(), "RECIPE_CLI_IO_ERROR: Empty input");
        assert_eq!(err.code(), "RECIPE_CLI_IO_ERROR");
    }

    #[test]
    fn test_config_error_code_passes_through() {
        let err = CliError::from(ConfigError::Invalid("bad".into()));
        assert_eq!(err.code(), "RECIPE_CONFIG_INVALID");
        assert!(err.to_string().starts_with("RECIPE_CONFIG_INVALID"));
    }
}

//! Application configuration
//!
//! Loaded from a JSON file, then overridden from the environment:
//!
//! - `RECIPES_PORT` - HTTP port
//! - `RECIPES_DATA_API_KEY` - Data API key
//!
//! A missing file is not an error; every field has a default.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::planner::{QueryPlanner, DEFAULT_RESULT_CAP, DEFAULT_SEARCH_INDEX};
use crate::store::{DataApiConfig, DataApiStore, InMemoryStore, RecipeStore, StoreError};

pub const PORT_ENV: &str = "RECIPES_PORT";
pub const API_KEY_ENV: &str = "RECIPES_DATA_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Cannot open store: {0}")]
    Store(#[from] StoreError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "RECIPE_CONFIG_READ",
            Self::Parse(_) => "RECIPE_CONFIG_PARSE",
            Self::Env { .. } => "RECIPE_CONFIG_ENV",
            Self::Invalid(_) => "RECIPE_CONFIG_INVALID",
            Self::Store(_) => "RECIPE_CONFIG_STORE",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which store implementation backs the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    DataApi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// JSON array of recipes loaded into the memory backend at boot
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    #[serde(default)]
    pub data_api_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_data_source")]
    pub data_source: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_search_index")]
    pub search_index: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_data_source() -> String {
    "Cluster0".to_string()
}
fn default_database() -> String {
    "recipes".to_string()
}
fn default_collection() -> String {
    "recipes".to_string()
}
fn default_search_index() -> String {
    DEFAULT_SEARCH_INDEX.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            seed_file: None,
            data_api_url: None,
            api_key: None,
            data_source: default_data_source(),
            database: default_database(),
            collection: default_collection(),
            search_index: default_search_index(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum rows per page
    #[serde(default = "default_result_cap")]
    pub result_cap: u64,
}

fn default_result_cap() -> u64 {
    DEFAULT_RESULT_CAP
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            result_cap: default_result_cap(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl AppConfig {
    /// Load from file, apply process environment overrides, validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file only; a missing file yields defaults
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides through a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: PORT_ENV,
                value: port.clone(),
            })?;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            if !key.is_empty() {
                self.store.api_key = Some(key);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.query.result_cap == 0 {
            return Err(ConfigError::Invalid("query.result_cap must be > 0".into()));
        }
        if self.store.backend == StoreBackend::DataApi {
            if self.store.data_api_url.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "store.data_api_url is required for the data_api backend".into(),
                ));
            }
            if self.store.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(format!(
                    "store.api_key (or {}) is required for the data_api backend",
                    API_KEY_ENV
                )));
            }
        }
        Ok(())
    }

    pub fn planner(&self) -> QueryPlanner {
        QueryPlanner::new(self.query.result_cap, self.store.search_index.clone())
    }

    /// Open the configured backend
    pub fn build_store(&self) -> ConfigResult<Arc<dyn RecipeStore>> {
        match self.store.backend {
            StoreBackend::Memory => {
                let store = match &self.store.seed_file {
                    Some(path) => InMemoryStore::from_seed_file(path)?,
                    None => InMemoryStore::new(),
                };
                Ok(Arc::new(store))
            }
            StoreBackend::DataApi => {
                let config = DataApiConfig {
                    url: self.store.data_api_url.clone().unwrap_or_default(),
                    api_key: self.store.api_key.clone().unwrap_or_default(),
                    data_source: self.store.data_source.clone(),
                    database: self.store.database.clone(),
                    collection: self.store.collection.clone(),
                    timeout: Duration::from_secs(self.store.timeout_secs),
                };
                Ok(Arc::new(DataApiStore::new(config)?))
            }
        }
    }
}

//! Listener and CORS settings for the recipe API

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Origin of the local web client during development
pub const DEV_CLIENT_ORIGIN: &str = "http://localhost:5173";

/// `server` section of the configuration file; missing keys take defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec![DEV_CLIENT_ORIGIN.to_string()],
        }
    }
}

impl HttpServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// `host:port` as handed to the listener
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_bind_locally() {
        let config = HttpServerConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
        assert_eq!(config.cors_origins, vec![DEV_CLIENT_ORIGIN.to_string()]);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 3001}"#).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_empty_origin_list_allows_any() {
        let config: HttpServerConfig =
            serde_json::from_str(r#"{"host": "0.0.0.0", "cors_origins": []}"#).unwrap();
        assert!(config.allows_any_origin());
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }
}

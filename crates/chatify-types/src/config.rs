//! Server configuration types for Chatify.
//!
//! `ServerConfig` represents the `config.toml` in the data directory. All
//! fields have defaults so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind the HTTP/WebSocket listener to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP/WebSocket listener to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// sqlx SQLite URL. `None` means `<data_dir>/chatify.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Base URL profile images are served from. `None` disables avatar
    /// resolution (every avatar resolves to the empty string).
    #[serde(default)]
    pub avatar_base_url: Option<String>,

    /// Timeout for a single avatar HEAD probe.
    #[serde(default = "default_avatar_probe_timeout_ms")]
    pub avatar_probe_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_avatar_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            avatar_base_url: None,
            avatar_probe_timeout_ms: default_avatar_probe_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert!(config.avatar_base_url.is_none());
        assert_eq!(config.avatar_probe_timeout_ms, 2_000);
    }

    #[test]
    fn test_server_config_deserialize_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_server_config_deserialize_with_values() {
        let toml_str = r#"
host = "0.0.0.0"
port = 9000
database_url = "sqlite:///tmp/chat.db"
avatar_base_url = "https://cdn.example.com/chatify"
avatar_probe_timeout_ms = 500
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///tmp/chat.db"));
        assert_eq!(
            config.avatar_base_url.as_deref(),
            Some("https://cdn.example.com/chatify")
        );
        assert_eq!(config.avatar_probe_timeout_ms, 500);
    }
}

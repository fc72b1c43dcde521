//! Configuration model for Synapse.

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Broker configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".synapse/synapse.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Broker/server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Agent id the broker registers itself under
    #[serde(default = "default_server_agent_id")]
    pub agent_id: String,

    /// Minutes between expired-context sweeps
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,

    /// Capacity of the broadcast channel for system_broadcast fan-out
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_server_agent_id() -> String {
    "mcp_server".to_string()
}

const fn default_cleanup_interval_minutes() -> u64 {
    15
}

const fn default_broadcast_capacity() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            agent_id: default_server_agent_id(),
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, ".synapse/synapse.db");
        assert_eq!(config.database.url(), "sqlite:.synapse/synapse.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.agent_id, "mcp_server");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"database": {"path": "/tmp/x.db"}}"#).unwrap();
        assert_eq!(config.database.path, "/tmp/x.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.cleanup_interval_minutes, 15);
    }
}

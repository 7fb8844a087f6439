//! Configuration management for the Pilar server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files, the `PORT` environment variable and command-line arguments.

use pilar_server::{config::DEFAULT_PORT, ServerConfig};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::{info, warn};

/// Environment variable consulted for the listening port.
pub const PORT_ENV_VAR: &str = "PORT";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_message_size() -> usize {
    64 * 1024
}

fn default_stats_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// IP address to listen on
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted client message in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Seconds between health log lines (0 disables them)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_message_size: default_max_message_size(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration. Missing keys in an existing file
    /// take their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config file
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies the value of the `PORT` environment variable.
    ///
    /// A missing, unparseable or zero value leaves the configured port alone.
    ///
    /// # Returns
    ///
    /// `true` if the port was overridden.
    pub fn apply_port_env(&mut self, value: Option<&str>) -> bool {
        let Some(raw) = value else {
            return false;
        };

        match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => {
                self.server.port = port;
                true
            }
            _ => {
                warn!(
                    "⚠️ Ignoring {}={:?}, keeping port {}",
                    PORT_ENV_VAR, raw, self.server.port
                );
                false
            }
        }
    }

    /// The socket address the server will bind.
    pub fn bind_address(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| format!("Invalid host: {}", &self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Converts the application configuration to a server configuration.
    ///
    /// # Returns
    ///
    /// A `ServerConfig` instance ready for use with the server.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.bind_address()?,
            max_message_size: self.server.max_message_size,
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        self.bind_address()?;

        if self.server.max_message_size == 0 {
            return Err("server.max_message_size must be greater than 0".to_string());
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};
    use tokio::fs;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_message_size, 65536);
        assert_eq!(config.server.stats_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_creates_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(path.exists());

        // the written file loads back to the same settings
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.server.host, config.server.host);
        assert_eq!(reloaded.logging.level, config.logging.level);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080
max_message_size = 1024
stats_interval_secs = 5

[logging]
level = "debug"
json_format = true
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_message_size, 1024);
        assert_eq!(config.server.stats_interval_secs, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[server]\nport = 4000\n").await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.stats_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[server\nport = ").await.unwrap();

        assert!(AppConfig::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_port_env_override() {
        let mut config = AppConfig::default();

        assert!(config.apply_port_env(Some("8081")));
        assert_eq!(config.server.port, 8081);

        assert!(!config.apply_port_env(None));
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_invalid_port_env_falls_back() {
        for raw in ["", "abc", "0", "70000", "-1"] {
            let mut config = AppConfig::default();
            assert!(!config.apply_port_env(Some(raw)), "{raw}");
            assert_eq!(config.server.port, 3000, "{raw}");
        }
    }

    #[test]
    fn test_to_server_config_conversion() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9000;
        config.server.max_message_size = 2048;

        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_address, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(server_config.max_message_size, 2048);
    }

    #[test]
    fn test_ipv6_host() {
        let mut config = AppConfig::default();
        config.server.host = "::1".to_string();
        assert_eq!(config.bind_address().unwrap(), "[::1]:3000".parse().unwrap());
    }

    #[test]
    fn test_validation_invalid_host() {
        let mut config = AppConfig::default();
        config.server.host = "not a host".to_string();
        assert!(config.validate().is_err());
        assert!(config.to_server_config().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        for level in ["trace", "debug", "info", "warn", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{level}");
        }
    }

    #[test]
    fn test_validation_zero_message_size() {
        let mut config = AppConfig::default();
        config.server.max_message_size = 0;
        assert!(config.validate().is_err());
    }
}

//! Main application configuration
//!
//! This module defines the primary configuration structures for the matchroom
//! service, including environment variable loading, TOML files and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    /// Accounts preloaded into the in-memory identity store
    pub users: Vec<SeedUser>,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub http_host: String,
    /// Port for the match endpoint, health and metrics
    pub http_port: u16,
    /// Route the match command endpoint is mounted on
    pub match_path: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Capacity of a room whose slot type has no explicit override
    pub default_room_capacity: usize,
    /// Capacity overrides per slot type
    pub slot_capacities: Vec<SlotCapacity>,
    /// Maximum partners remembered per user before the oldest is evicted
    pub recency_capacity: usize,
}

/// Capacity override for one slot type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCapacity {
    pub slot_type: i32,
    pub capacity: usize,
}

/// A user account to register at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub auth_token: String,
    #[serde(default)]
    pub location: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "matchroom".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 10060,
            match_path: "/match".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            default_room_capacity: 4,
            slot_capacities: Vec::new(),
            recency_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validation
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| anyhow!("Invalid configuration file: {}", e))
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(path) = env::var("MATCH_PATH") {
            self.service.match_path = path;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(capacity) = env::var("DEFAULT_ROOM_CAPACITY") {
            self.matchmaking.default_room_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_ROOM_CAPACITY value: {}", capacity))?;
        }
        if let Ok(capacity) = env::var("RECENCY_CAPACITY") {
            self.matchmaking.recency_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid RECENCY_CAPACITY value: {}", capacity))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if !config.service.match_path.starts_with('/') {
        return Err(anyhow!(
            "Match path must start with '/': {}",
            config.service.match_path
        ));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.matchmaking.default_room_capacity < 2 {
        return Err(anyhow!("Default room capacity must be at least 2"));
    }
    if let Some(entry) = config
        .matchmaking
        .slot_capacities
        .iter()
        .find(|entry| entry.capacity == 0)
    {
        return Err(anyhow!(
            "Capacity for slot type {} cannot be 0",
            entry.slot_type
        ));
    }
    if config.matchmaking.recency_capacity == 0 {
        return Err(anyhow!("Recency capacity must be greater than 0"));
    }

    for user in &config.users {
        if user.username.is_empty() || user.auth_token.is_empty() {
            return Err(anyhow!("Seed users need a username and an auth token"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matchmaking.default_room_capacity, 4);
        assert_eq!(config.bind_address(), "0.0.0.0:10060");
    }

    #[test]
    fn test_toml_parsing_with_partial_sections() {
        let raw = r#"
            [service]
            http_port = 9000

            [matchmaking]
            recency_capacity = 4

            [[matchmaking.slot_capacities]]
            slot_type = 2
            capacity = 2

            [[users]]
            username = "Alice"
            auth_token = "alice-token"
            location = "10.0.0.1:3074"
        "#;

        let config = AppConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.service.http_port, 9000);
        assert_eq!(config.service.match_path, "/match");
        assert_eq!(config.matchmaking.recency_capacity, 4);
        assert_eq!(
            config.matchmaking.slot_capacities,
            vec![SlotCapacity {
                slot_type: 2,
                capacity: 2
            }]
        );
        assert_eq!(config.users.len(), 1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.matchmaking.slot_capacities.push(SlotCapacity {
            slot_type: 3,
            capacity: 0,
        });
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.matchmaking.recency_capacity = 0;
        assert!(validate_config(&config).is_err());
    }
}

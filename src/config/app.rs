//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::DEFAULT_INTERVAL;
use crate::probe::CommandProbe;
use crate::storage::StorageBuilder;

use super::validation::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default database file.
pub const DEFAULT_DB_PATH: &str = "data/blockchain.db";

/// Minimum collection interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default writer channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = crate::storage::DEFAULT_CHANNEL_CAPACITY;

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path (default: "data/blockchain.db").
    #[serde(default = "default_db_path")]
    pub path: String,

    /// MPSC channel capacity for the writer actor (default: 64).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl DatabaseConfig {
    /// Storage builder for this database.
    pub fn storage_builder(&self) -> StorageBuilder {
        StorageBuilder::new(&self.path).channel_capacity(self.channel_capacity)
    }
}

// =============================================================================
// Probe Configuration
// =============================================================================

/// External metrics program configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Program to run; invoked with no arguments.
    pub command: String,

    /// Kill the program after this long (default: no timeout).
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl ProbeConfig {
    /// Build the command probe described by this config.
    pub fn to_probe(&self) -> CommandProbe {
        let probe = CommandProbe::new(&self.command);
        match self.timeout {
            Some(timeout) => probe.with_timeout(timeout),
            None => probe,
        }
    }
}

// =============================================================================
// Collector Configuration
// =============================================================================

/// Collector cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Sleep between cycles (default: 60s, minimum: 1s).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Metrics probe configuration.
    pub probe: ProbeConfig,

    /// Collector configuration.
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database path cannot be empty".to_string(),
            ));
        }

        if self.database.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "database channel_capacity must be positive".to_string(),
            ));
        }

        if self.probe.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "probe command cannot be empty".to_string(),
            ));
        }

        if self.probe.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationError(
                "probe timeout must be non-zero".to_string(),
            ));
        }

        if self.collector.interval < MIN_INTERVAL {
            return Err(ConfigError::ValidationError(format!(
                "collector interval must be at least {:?}, got {:?}",
                MIN_INTERVAL, self.collector.interval
            )));
        }

        Ok(())
    }

    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

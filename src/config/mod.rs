//! Configuration module.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Database settings (path, writer channel capacity)
//! - Probe settings (command, optional timeout)
//! - Collector cadence

mod app;
mod validation;

pub use app::{AppConfig, CollectorConfig, DatabaseConfig, ProbeConfig, ServerConfig};
pub use validation::{ConfigError, parse_duration};

// Re-export constants
pub use app::{DEFAULT_DB_PATH, MIN_INTERVAL};

//! Configuration management for the rule export.
//! This module handles loading configuration settings from built-in
//! defaults, an optional `.env` file and environment variables.

mod settings;

pub use settings::{Settings, CloudflareConfig, ExportConfig, FetchConfig, WorkerConfig};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, config::ConfigError>;

/// Load the application configuration
pub fn load_config() -> ConfigResult<Settings> {
    Settings::load()
}

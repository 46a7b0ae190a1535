//! Node configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `ROOM_RELAY_` prefix
//! and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use room_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Relaying through {}", config.bus.url);
//! ```

mod adapter;
mod bus;
mod error;
mod node;

pub use adapter::AdapterConfig;
pub use bus::BusConfig;
pub use error::{ConfigError, ValidationError};
pub use node::{Environment, NodeConfig};

use serde::Deserialize;

/// Root node configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bus transport (Redis pub/sub)
    pub bus: BusConfig,

    /// Channel naming and served namespaces
    #[serde(default)]
    pub adapter: AdapterConfig,

    /// Process settings (environment, logging)
    #[serde(default)]
    pub node: NodeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ROOM_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ROOM_RELAY__BUS__URL=redis://...` -> `bus.url = ...`
    /// - `ROOM_RELAY__ADAPTER__NAMESPACES=/,/chat` -> `adapter.namespaces = "/,/chat"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROOM_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.node.validate()?;
        self.bus.validate()?;
        self.adapter.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.node.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("ROOM_RELAY__BUS__URL", "redis://localhost:6379");
    }

    fn clear_env() {
        env::remove_var("ROOM_RELAY__BUS__URL");
        env::remove_var("ROOM_RELAY__BUS__TIMEOUT_SECS");
        env::remove_var("ROOM_RELAY__ADAPTER__KEY");
        env::remove_var("ROOM_RELAY__ADAPTER__DELIMITER");
        env::remove_var("ROOM_RELAY__ADAPTER__NAMESPACES");
        env::remove_var("ROOM_RELAY__NODE__ENVIRONMENT");
        env::remove_var("ROOM_RELAY__NODE__JSON_LOGS");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.bus.url, "redis://localhost:6379");
        assert_eq!(config.bus.timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_adapter_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.adapter.key, "socket.io");
        assert_eq!(config.adapter.delimiter, ".");
        assert_eq!(config.adapter.namespaces, "/");
    }

    #[test]
    fn test_adapter_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ROOM_RELAY__ADAPTER__KEY", "relay");
        env::set_var("ROOM_RELAY__ADAPTER__DELIMITER", "#");
        env::set_var("ROOM_RELAY__ADAPTER__NAMESPACES", "/,/chat");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        let namer = config.adapter.channel_namer().unwrap();
        assert_eq!(namer.prefix(), "relay");
        assert_eq!(namer.delimiter(), '#');
        assert_eq!(config.adapter.namespace_list().unwrap().len(), 2);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ROOM_RELAY__NODE__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_bus_url_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOM_RELAY__BUS__URL", "http://localhost:6379");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBusUrl)
        ));
    }
}

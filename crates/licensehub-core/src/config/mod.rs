//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod client;
pub mod engine;
pub mod logging;
pub mod secrets;

use serde::{Deserialize, Serialize};

pub use self::client::ClientConfig;
pub use self::engine::EngineConfig;
pub use self::logging::LoggingConfig;
pub use self::secrets::SecretsConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Client-side license manager settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Server-side activation engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Licensing secrets settings.
    #[serde(default)]
    pub secrets: SecretsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `LICENSEHUB`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LICENSEHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Cross-section validation.
    ///
    /// The server reclamation timeout must not be shorter than the client
    /// heartbeat interval, otherwise healthy clients would be reclaimed
    /// between two heartbeats.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.engine.activation_timeout_seconds < self.client.heartbeat_interval_seconds {
            return Err(AppError::configuration(format!(
                "engine.activation_timeout_seconds ({}) must be >= client.heartbeat_interval_seconds ({})",
                self.engine.activation_timeout_seconds, self.client.heartbeat_interval_seconds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn timeout_below_heartbeat_is_rejected() {
        let mut config = AppConfig::default();
        config.engine.activation_timeout_seconds = 60;
        config.client.heartbeat_interval_seconds = 300;
        assert!(config.validate().is_err());
    }
}

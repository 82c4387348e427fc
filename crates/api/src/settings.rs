//! Server settings

use crate::ApiError;
use alerting::AlertConfig;
use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "ALERT_ROUTER_CONFIG";

/// Config file used when `ALERT_ROUTER_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/alert-router.toml";

/// Prefix for environment overrides, e.g. `ALERT_ROUTER__ALERT__SITE`
const ENV_PREFIX: &str = "ALERT_ROUTER";

/// Top-level configuration for the alert router process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Alert engine settings
    pub alert: AlertConfig,
    /// Ingestion limits
    pub validation: ValidationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            alert: AlertConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// Load configuration from the config file (optional) and environment
pub fn load_config() -> Result<ServerConfig, ApiError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(&path)
}

/// Load configuration from `path` layered under environment overrides
pub fn load_config_from(path: &str) -> Result<ServerConfig, ApiError> {
    info!("Loading configuration from {}", path);
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

//! Pool configuration: runtime struct, file schema, and layered loader.

use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for an `InstancePool`.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of simultaneously leased instances.
    pub capacity: usize,
    /// Default wait bound for `checkout`; `None` waits indefinitely.
    pub checkout_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            checkout_timeout: None,
        }
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load or merge configuration.
    #[error("configuration error: {0}")]
    Load(String),
}

/// Top-level host configuration (vitrine.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitrineConfig {
    /// Instance pool settings.
    #[serde(default)]
    pub pool: PoolSettings,
    /// Logging settings, applied by the host process.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Instance pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Maximum number of simultaneously leased instances.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Checkout wait bound in milliseconds; 0 waits indefinitely.
    #[serde(default)]
    pub checkout_timeout_ms: u64,
}

impl PoolSettings {
    /// Converts the file schema into the runtime [`PoolConfig`].
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            capacity: self.capacity,
            checkout_timeout: match self.checkout_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            checkout_timeout_ms: 0,
        }
    }
}

fn default_capacity() -> usize {
    4
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (e.g. "info", "debug", "vitrine=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads configuration by merging layers:
/// 1. Default values
/// 2. Config file (if exists)
/// 3. Environment variables (VITRINE_ prefix)
///
/// Environment keys nest by splitting on `_`, so only single-word
/// field names are reachable from the environment
/// (`VITRINE_POOL_CAPACITY`); multi-word fields such as
/// `checkout_timeout_ms` can only be set in the file.
pub fn load_config(config_path: Option<&str>) -> Result<VitrineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(VitrineConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("VITRINE_").split("_"));

    figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))
}


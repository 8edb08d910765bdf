//! Configuration module for loading and parsing TOML configuration files.

use quote_client::{HttpConfig, ProviderKind, PublicSourcesConfig};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "DESK_CONFIG";

/// Config file used when `DESK_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Quote source configuration.
    pub quotes: QuotesConfig,
    /// Order monitor configuration.
    pub monitor: MonitorConfig,
    /// Persistence configuration.
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Quote source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    /// Active provider; public sources only when unset.
    pub provider: Option<ProviderKind>,
    /// Overrides the provider's default base URL.
    pub provider_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Public fallback hosts.
    pub public: PublicSourcesConfig,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            provider: None,
            provider_base_url: None,
            timeout_secs: 12,
            public: PublicSourcesConfig::default(),
        }
    }
}

impl QuotesConfig {
    /// HTTP settings for every quote request.
    #[must_use]
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            ..HttpConfig::default()
        }
    }
}

/// Order monitor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Start the loop when the server starts.
    pub autostart: bool,
    /// Seconds between ticks.
    pub interval_secs: u64,
    /// A heartbeat older than this many seconds is stale.
    pub stale_after_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            autostart: true,
            interval_secs: 30,
            stale_after_secs: 180,
        }
    }
}

impl MonitorConfig {
    /// Tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Stale threshold.
    #[must_use]
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX))
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON document holding the ledger and heartbeat. In memory when unset.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `DESK_CONFIG` (default `config.toml`), falling
    /// back to defaults when it does not exist, then applies `HOST`/`PORT`.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed, or an
    /// override is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path);
                config
            }
            Err(ConfigError::ReadError(e)) if e.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(e),
        };

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("PORT must be a valid number: {}", port)))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "server host cannot be empty".to_string(),
            ));
        }
        if self.quotes.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "quotes timeout_secs must be positive".to_string(),
            ));
        }
        if url::Url::parse(&self.quotes.public.yahoo_base_url).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "quotes.public yahoo_base_url is not a URL: {}",
                self.quotes.public.yahoo_base_url
            )));
        }
        for host in &self.quotes.public.csv_hosts {
            if url::Url::parse(host).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "quotes.public csv host is not a URL: {}",
                    host
                )));
            }
        }
        if let Some(base) = &self.quotes.provider_base_url
            && url::Url::parse(base).is_err()
        {
            return Err(ConfigError::InvalidValue(format!(
                "quotes provider_base_url is not a URL: {}",
                base
            )));
        }
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "monitor interval_secs must be positive".to_string(),
            ));
        }
        if self.monitor.stale_after_secs < self.monitor.interval_secs {
            return Err(ConfigError::InvalidValue(
                "monitor stale_after_secs must be at least interval_secs".to_string(),
            ));
        }

        Ok(())
    }
}

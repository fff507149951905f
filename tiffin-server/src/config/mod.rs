//! Configuration module for tiffin-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments, and
//! environment variables. Missing or empty gateway credentials are fatal
//! here, at startup, so that signing can never fail per-request.

pub mod file;

use crate::config::file::FileConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tiffin_core::gateway::GatewayConfig;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub gateway: GatewayConfig,
    pub app_base_url: Url,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the gateway credentials
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            gateway: GatewayConfig {
                host_url: file_config.gateway.host_url,
                merchant_id: file_config.gateway.merchant_id,
                salt_key: file_config.gateway.salt_key,
                salt_index: file_config.gateway.salt_index,
                timeout: Duration::from_secs(file_config.gateway.timeout_secs),
            },
            app_base_url: file_config.app.base_url,
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.gateway.merchant_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.merchant_id is empty".into(),
            ));
        }
        if config.gateway.salt_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.salt_key is empty".into(),
            ));
        }
        if config.gateway.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

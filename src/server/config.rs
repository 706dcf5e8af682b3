//! Similarity Endpoint Configuration

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{EmbeddingError, ModelConfig};
use crate::similarity::TruncationLimits;

/// Default listening port
pub const DEFAULT_PORT: u16 = 4998;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub truncation: TruncationLimits,
    pub model: ModelConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Loopback address or "localhost"
    pub bind_host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Model(#[from] EmbeddingError),
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Read `path` if it exists, otherwise use the defaults; validated either way
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            info!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.network.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "network.max_body_bytes must be positive".to_string(),
            ));
        }

        self.truncation.validate().map_err(ConfigError::Invalid)?;
        self.model.validate()?;
        Ok(())
    }

    /// Listening address; only loopback hosts are accepted
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.network.bind_host.trim();
        let ip = if host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            host.parse::<IpAddr>().map_err(|_| {
                ConfigError::Invalid(format!("network.bind_host '{}' is not an IP address", host))
            })?
        };

        if !ip.is_loopback() {
            return Err(ConfigError::Invalid(format!(
                "network.bind_host '{}' is not a loopback address",
                host
            )));
        }

        Ok(SocketAddr::new(ip, self.network.port))
    }
}

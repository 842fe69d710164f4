//! Configuration loading from eventlog.toml.

use std::path::Path;
use std::time::Duration;

use logstore::StoreConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log file locations.
    #[serde(default)]
    pub store: StoreConfig,

    /// Diagnostic output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Request server settings for `eventlog serve`.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Diagnostic logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `logstore=debug`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

/// Request server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// Seconds a single store call may take before the request fails.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest accepted request line, in bytes.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    rpc::DEFAULT_TIMEOUT.as_secs()
}

fn default_max_request_bytes() -> usize {
    rpc::MAX_REQUEST_SIZE
}

impl ServerSettings {
    pub fn to_server_config(&self) -> Result<rpc::ServerConfig, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("server.timeout_secs must be > 0".into()));
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_request_bytes must be > 0".into(),
            ));
        }
        Ok(rpc::ServerConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_request_size: self.max_request_bytes,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

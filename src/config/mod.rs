//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `RETELL_BRIDGE__`-prefixed environment variables
//! (e.g. `RETELL_BRIDGE__RETELL__TRUNK=my-trunk`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "RETELL_BRIDGE_CONFIG";
/// Config file looked up when `RETELL_BRIDGE_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "retell-bridge";

const ENV_PREFIX: &str = "RETELL_BRIDGE";
const RESERVED_PATHS: [&str; 2] = ["/health", "/metrics"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub retell: RetellConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetellConfig {
    /// WebSocket path the runtime connects to
    pub path: String,
    /// SIP header whose presence marks a call placed by Retell
    pub auth_header: String,
    /// Outbound trunk that reaches Retell
    pub trunk: String,
    /// Hook path the runtime calls on REFER
    pub refer_hook: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            retell: RetellConfig {
                path: "/retell".to_string(),
                auth_header: "X-Authenticated-User".to_string(),
                trunk: "Retell-jambonz-hosted".to_string(),
                refer_hook: "/refer".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load from the file named by `RETELL_BRIDGE_CONFIG` (or the default
    /// path) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load with `path` as the optional config file
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let retell = &self.retell;

        for (name, path) in [("retell.path", &retell.path), ("retell.refer_hook", &retell.refer_hook)] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with '/', got {:?}",
                    name, path
                )));
            }
        }

        if RESERVED_PATHS.contains(&retell.path.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "retell.path {} is reserved",
                retell.path
            )));
        }

        if retell.auth_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "retell.auth_header must not be empty".to_string(),
            ));
        }

        if retell.trunk.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "retell.trunk must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

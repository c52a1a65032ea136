//! # Zonebridge Configuration
//!
//! Typed configuration with sensible defaults, validation, and hot-reload
//! support. The on-disk format is the control panel's flat `key=value`
//! file: one setting per line, `#`/`;` comments, repeatable keys for
//! list-valued settings (`allowed_zone`, `nameserver`) whose values may
//! also be comma-separated.
//!
//! ```text
//! listen_address = 0.0.0.0
//! listen_port    = 53
//! pid_file       = /run/zonebridge.pid
//! resync_command = /usr/local/bin/panel-resync --zone
//! allowed_zone   = example.com, *.customer.example
//! api_url        = http://127.0.0.1:8081
//! api_key        = secret
//! ns_policy      = ensure
//! nameserver     = ns1.example.net
//! nameserver     = ns2.example.net
//! ```

#![warn(missing_docs)]

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use url::Url;
use zonebridge_model::{NameserverPolicy, PolicyMode};

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// A line could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A value is syntactically valid but unusable.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The configuration key.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete zonebridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NOTIFY listener settings.
    pub listener: ListenerConfig,

    /// Remote DNS API settings.
    pub api: ApiConfig,

    /// Resync dispatch settings.
    pub dispatch: DispatchConfig,

    /// Delegation policy applied during reconciliation.
    pub policy: NameserverPolicy,

    /// Zones NOTIFYs are accepted for; empty accepts every zone.
    pub allowed_zones: Vec<String>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            api: ApiConfig::default(),
            dispatch: DispatchConfig::default(),
            policy: NameserverPolicy::default(),
            allowed_zones: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// NOTIFY listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address.
    pub address: IpAddr,

    /// Bind port (UDP and TCP).
    pub port: u16,

    /// PID file written while the listener runs.
    pub pid_file: Option<PathBuf>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 53,
            pid_file: None,
        }
    }
}

/// Remote DNS API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://127.0.0.1:8081`.
    pub url: String,

    /// API key sent in the `X-API-Key` header.
    pub key: String,

    /// Server id in API paths.
    pub server_id: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            server_id: "localhost".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Resync dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Resync command, already split into words; the zone name is
    /// appended as the final argument.
    pub resync_command: Vec<String>,

    /// Maximum concurrently running resync actions.
    pub max_dispatch: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            resync_command: Vec::new(),
            max_dispatch: 4,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (`trace`..`error`).
    pub level: String,

    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Loads configuration from a flat `key=value` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_kv(&content)
    }

    /// Parses configuration from `key=value` text.
    ///
    /// Unknown keys are ignored so a shared panel configuration file can
    /// carry settings for other tools.
    pub fn from_kv(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or(ConfigError::Parse {
                line: line_no,
                message: format!("expected key=value, got {line:?}"),
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            config.apply(&key, value, line_no)?;
        }

        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str, line: usize) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str, line: usize) -> Result<T>
        where
            T::Err: std::fmt::Display,
        {
            value.parse().map_err(|e| ConfigError::Parse {
                line,
                message: format!("{key}: {e}"),
            })
        }

        match key {
            "listen_address" => self.listener.address = parse(key, value, line)?,
            "listen_port" => self.listener.port = parse(key, value, line)?,
            "pid_file" => self.listener.pid_file = Some(PathBuf::from(value)),
            "log_file" => self.logging.file = Some(PathBuf::from(value)),
            "log_level" => self.logging.level = value.to_string(),
            "resync_command" => {
                self.dispatch.resync_command =
                    value.split_whitespace().map(str::to_string).collect();
            }
            "max_dispatch" => self.dispatch.max_dispatch = parse(key, value, line)?,
            "allowed_zone" => {
                self.allowed_zones.extend(split_list(value));
            }
            "api_url" => self.api.url = value.to_string(),
            "api_key" => self.api.key = value.to_string(),
            "api_server_id" => self.api.server_id = value.to_string(),
            "api_timeout_secs" => self.api.timeout_secs = parse(key, value, line)?,
            "ns_policy" => {
                self.policy.mode = match value.to_ascii_lowercase().as_str() {
                    "force" => PolicyMode::Force,
                    "ensure" => PolicyMode::Ensure,
                    "default" | "none" => PolicyMode::Default,
                    other => {
                        return Err(ConfigError::Parse {
                            line,
                            message: format!("ns_policy: unknown mode {other:?}"),
                        })
                    }
                };
            }
            "nameserver" => {
                self.policy.nameservers.extend(split_list(value));
            }
            // Unknown keys belong to other consumers of the shared file.
            _ => {}
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.api.url.is_empty() {
            Url::parse(&self.api.url).map_err(|e| ConfigError::InvalidValue {
                field: "api_url".to_string(),
                message: e.to_string(),
            })?;
        }

        if self.dispatch.max_dispatch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_dispatch".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api_timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.policy.is_active() && self.policy.nameservers.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ns_policy".to_string(),
                message: format!(
                    "{} policy requires at least one nameserver entry",
                    self.policy.mode.as_str()
                ),
            });
        }

        Ok(())
    }
}

/// Splits a repeatable list value on commas, trimming entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Thread-safe configuration holder with hot-reload support.
pub struct ConfigHolder {
    config: ArcSwap<Config>,
    path: RwLock<Option<PathBuf>>,
}

impl ConfigHolder {
    /// Creates a holder around an in-memory configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::new(Arc::new(config)),
            path: RwLock::new(None),
        }
    }

    /// Creates a holder backed by a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::from_file(path)?;
        config.validate()?;
        Ok(Self {
            config: ArcSwap::new(Arc::new(config)),
            path: RwLock::new(Some(path.to_path_buf())),
        })
    }

    /// Returns the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Re-reads the backing file and swaps the configuration in.
    ///
    /// A validation failure leaves the previous configuration in place.
    pub fn reload(&self) -> Result<()> {
        let path = self.path.read();
        if let Some(p) = path.as_ref() {
            let config = Config::from_file(p)?;
            config.validate()?;
            self.config.store(Arc::new(config));
        }
        Ok(())
    }

    /// Replaces the configuration directly.
    pub fn update(&self, config: Config) {
        self.config.store(Arc::new(config));
    }
}

impl Default for ConfigHolder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/*!
 * Configuration structures for Tether
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tether_core_reconnect::ReconnectConfig;

use crate::error::{Result, TetherError};

/// Top-level configuration for a tethered connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetherConfig {
    /// Remote host name or address literal
    #[serde(default = "default_host")]
    pub host: String,

    /// Remote port
    #[serde(default)]
    pub port: u16,

    /// How often the event loop calls `heartbeat`, in milliseconds
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Line sent to the peer when each session starts
    #[serde(default)]
    pub greeting: Option<String>,

    /// Backoff and suppression tuning
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
            greeting: None,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    100
}

impl TetherConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| TetherError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TetherConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| TetherError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check that the configuration can drive a connection
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(TetherError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(TetherError::Config("port must be non-zero".to_string()));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(TetherError::Config(
                "heartbeat_interval_ms must be positive".to_string(),
            ));
        }
        self.reconnect.validate()?;
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

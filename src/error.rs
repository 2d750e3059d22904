/*!
 * Error types for Tether
 */

use std::io;
use std::path::PathBuf;
use tether_core_reconnect::ReconnectError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TetherError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_CONFIG: i32 = 3;

#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file was not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reconnect state machine rejected an operation
    #[error("Reconnect error: {0}")]
    Reconnect(#[from] ReconnectError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

impl TetherError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TetherError::Config(_)
            | TetherError::ConfigFile { .. }
            | TetherError::ConfigParse(_)
            | TetherError::Reconnect(ReconnectError::Config(_)) => EXIT_CONFIG,
            _ => EXIT_FATAL,
        }
    }

    /// Whether the error came from bad operator input
    pub fn is_config_error(&self) -> bool {
        self.exit_code() == EXIT_CONFIG
    }
}

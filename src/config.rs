//! Configuration types for the media organizer

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default ntfy server
pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

/// File operation mode, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to destination, preserving timestamps
    #[default]
    Copy,
    /// Move files to destination
    Move,
}

/// Completion notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtfyConfig {
    /// Topic to publish to
    pub topic: String,

    /// Server base URL
    #[serde(default = "default_ntfy_server")]
    pub server: String,

    /// Message priority (1-5)
    #[serde(default = "default_ntfy_priority")]
    pub priority: u8,

    /// Comma-separated tags
    #[serde(default = "default_ntfy_tags")]
    pub tags: String,
}

fn default_ntfy_server() -> String {
    DEFAULT_NTFY_SERVER.to_string()
}

fn default_ntfy_priority() -> u8 {
    3
}

fn default_ntfy_tags() -> String {
    "file,organize".to_string()
}

impl NtfyConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            server: default_ntfy_server(),
            priority: default_ntfy_priority(),
            tags: default_ntfy_tags(),
        }
    }
}

/// Configuration for one organizer run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for media files
    #[serde(default)]
    pub source_dir: PathBuf,

    /// Root of the year/month/day tree
    #[serde(default)]
    pub destination_dir: PathBuf,

    /// File operation mode
    #[serde(default)]
    pub operation: FileOperation,

    /// Completion notification, disabled when absent
    #[serde(default)]
    pub ntfy: Option<NtfyConfig>,
}

impl Config {
    /// Configuration for a source/destination pair with default settings
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

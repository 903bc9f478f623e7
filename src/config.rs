//! objectfs configuration

use serde::{Deserialize, Serialize};

/// Default configuration constants
///
/// This module centralizes all default values used throughout the crate so
/// deployments that need different scoping or chunking adjust them in one
/// place.
pub mod defaults {

    /// Default chunk size for newly created objects: 256 KiB.
    ///
    /// Small enough that partial reads of large objects stay cheap, large
    /// enough to keep per-chunk overhead negligible for typical documents.
    pub const CHUNK_SIZE: usize = 256 * 1024;

    /// Default bucket scoping identifier resolution.
    pub const fn default_root() -> &'static str {
        "fs"
    }

    /// Default logical namespace.
    pub const fn default_namespace() -> &'static str {
        "objectfs"
    }

    /// Default log level
    pub const fn default_log_level() -> &'static str {
        "info"
    }
}

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// Logical namespace within the backing store.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Bucket within the namespace holding the files.
    #[serde(default = "default_root")]
    pub root: String,

    /// Chunk size in bytes for newly created objects.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_namespace() -> String {
    defaults::default_namespace().to_string()
}

fn default_root() -> String {
    defaults::default_root().to_string()
}

fn default_chunk_size() -> usize {
    defaults::CHUNK_SIZE
}

fn default_log_level() -> String {
    defaults::default_log_level().to_string()
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            root: default_root(),
            chunk_size: default_chunk_size(),
            log_level: default_log_level(),
        }
    }
}

impl FsConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("Failed to read config file: {}", e)))?;

        let config: FsConfig = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializeError(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::WriteError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::ValidationError(
                "Namespace cannot be empty".to_string(),
            ));
        }

        if self.root.is_empty() {
            return Err(ConfigError::ValidationError(
                "Root cannot be empty".to_string(),
            ));
        }

        // Chunk size must be > 0 and <= 128MB
        if self.chunk_size == 0 || self.chunk_size > 128 * 1024 * 1024 {
            return Err(ConfigError::ValidationError(
                "Chunk size must be between 1 and 128MB".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}",
                    self.log_level
                )));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to serialize config: {0}")]
    SerializeError(String),

    #[error("Failed to write config: {0}")]
    WriteError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

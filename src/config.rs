//! # Configuration Management
//!
//! Centralized configuration for crypto DTO channels.
//!
//! This module provides structured configuration for replay protection,
//! inbound packet limits, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment variable overrides via `from_env()`
//!
//! ## Security Considerations
//! - The default replay window (100) tolerates datagram reordering while
//!   keeping per-channel memory bounded
//! - Inbound packets are size-checked before any parsing

use crate::error::{CryptoDtoError, Result};
use crate::utils::replay_window::{ReplayPolicy, DEFAULT_WINDOW_SIZE};
use crate::utils::crypto::TAG_LEN;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Largest packet the 16-bit length fields can describe: header, name and
/// payload each at their maximum, plus three prefixes and the tag.
pub const MAX_PACKET_SIZE: usize = 3 * (2 + u16::MAX as usize) + TAG_LEN;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CryptoDtoConfig {
    /// Replay protection
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Inbound packet limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CryptoDtoConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CryptoDtoError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CryptoDtoError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CryptoDtoError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(policy) = std::env::var("CRYPTO_DTO_REPLAY_POLICY") {
            config.replay.policy = match policy.to_ascii_lowercase().as_str() {
                "strict" => ReplayPolicyKind::Strict,
                "window" => ReplayPolicyKind::Window,
                other => {
                    return Err(CryptoDtoError::ConfigError(format!(
                        "Invalid CRYPTO_DTO_REPLAY_POLICY: {other}"
                    )))
                }
            };
        }

        if let Ok(size) = std::env::var("CRYPTO_DTO_REPLAY_WINDOW") {
            if let Ok(val) = size.parse::<u32>() {
                config.replay.window_size = val;
            }
        }

        if let Ok(max) = std::env::var("CRYPTO_DTO_MAX_PACKET_SIZE") {
            if let Ok(val) = max.parse::<usize>() {
                config.limits.max_packet_size = val;
            }
        }

        if let Ok(level) = std::env::var("CRYPTO_DTO_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                CryptoDtoError::ConfigError(format!("Invalid CRYPTO_DTO_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CryptoDtoError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CryptoDtoError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.replay.validate());
        errors.extend(self.limits.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CryptoDtoError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Replay policy selector as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplayPolicyKind {
    /// Strictly increasing sequences only
    Strict,
    /// Bounded reorder window
    #[default]
    Window,
}

/// Replay protection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Which policy to enforce
    pub policy: ReplayPolicyKind,

    /// Reorder tolerance when `policy = "window"`
    pub window_size: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            policy: ReplayPolicyKind::Window,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ReplayConfig {
    /// Resolve to the policy the sequence windows enforce
    pub fn policy(&self) -> ReplayPolicy {
        match self.policy {
            ReplayPolicyKind::Strict => ReplayPolicy::StrictMonotonic,
            ReplayPolicyKind::Window => ReplayPolicy::Window {
                size: self.window_size,
            },
        }
    }

    /// Validate replay configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.policy == ReplayPolicyKind::Window {
            if self.window_size == 0 {
                errors.push("Replay window size must be greater than 0".to_string());
            } else if self.window_size > 65_536 {
                errors.push(format!(
                    "Replay window too large: {} (maximum: 65536)",
                    self.window_size
                ));
            }
        }

        errors
    }
}

/// Inbound packet limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Packets larger than this are dropped before parsing
    pub max_packet_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl LimitsConfig {
    /// Validate limits
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // prefix + smallest header + two empty envelope prefixes + tag
        if self.max_packet_size < 2 + 1 + 4 + TAG_LEN {
            errors.push(format!(
                "Max packet size too small: {} bytes",
                self.max_packet_size
            ));
        } else if self.max_packet_size > MAX_PACKET_SIZE {
            errors.push(format!(
                "Max packet size too large: {} bytes (maximum: {MAX_PACKET_SIZE})",
                self.max_packet_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to file instead of stdout
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("crypto-dto"),
            log_level: Level::INFO,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

//! Configuration management infrastructure.
//!
//! Persists MAC protection preferences (algorithms, placeholder sizing and
//! default container location) as TOML.

use crate::domain::algorithms::{KeyWrapAlgorithm, MacAlgorithm, MacDigestAlgorithm};
use crate::domain::constants::BYTE_RANGE_PLACEHOLDER_WIDTH;
use crate::domain::document::MacLocation;
use crate::domain::properties::MacProperties;
use crate::infra::error::{MacError, MacResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Narrowest `/ByteRange` placeholder that can hold realistic offsets.
const MIN_BYTE_RANGE_WIDTH: usize = 32;

/// MAC protection preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacConfiguration {
    /// Digest algorithm name (sha256, sha384, sha512, sha3-256, sha3-384, sha3-512)
    pub digest_algorithm: String,

    /// MAC algorithm name
    pub mac_algorithm: String,

    /// Key wrap algorithm name
    pub key_wrap_algorithm: String,

    /// Width in bytes reserved for the `/ByteRange` array text
    pub byte_range_placeholder_width: usize,

    /// "standalone" or "attached"
    pub default_location: String,
}

impl Default for MacConfiguration {
    fn default() -> Self {
        let properties = MacProperties::default();
        Self {
            digest_algorithm: properties.digest_algorithm().as_str().to_string(),
            mac_algorithm: properties.mac_algorithm().as_str().to_string(),
            key_wrap_algorithm: properties.key_wrap_algorithm().as_str().to_string(),
            byte_range_placeholder_width: BYTE_RANGE_PLACEHOLDER_WIDTH,
            default_location: "standalone".to_string(),
        }
    }
}

impl MacConfiguration {
    /// Resolve algorithm names through the registry.
    pub fn to_properties(&self) -> MacResult<MacProperties> {
        let digest = self
            .digest_algorithm
            .parse::<MacDigestAlgorithm>()
            .map_err(|_| {
                MacError::ConfigurationError(format!(
                    "Invalid digest algorithm: {}",
                    self.digest_algorithm
                ))
            })?;
        let mac = self.mac_algorithm.parse::<MacAlgorithm>().map_err(|_| {
            MacError::ConfigurationError(format!("Invalid MAC algorithm: {}", self.mac_algorithm))
        })?;
        let wrap = self
            .key_wrap_algorithm
            .parse::<KeyWrapAlgorithm>()
            .map_err(|_| {
                MacError::ConfigurationError(format!(
                    "Invalid key wrap algorithm: {}",
                    self.key_wrap_algorithm
                ))
            })?;
        Ok(MacProperties::new(digest, mac, wrap))
    }

    pub fn location(&self) -> MacResult<MacLocation> {
        parse_location(&self.default_location)
    }

    /// Validate configuration values
    pub fn validate(&self) -> MacResult<()> {
        self.to_properties()?;
        self.location()?;
        if self.byte_range_placeholder_width < MIN_BYTE_RANGE_WIDTH {
            return Err(MacError::ConfigurationError(format!(
                "Byte range placeholder width must be at least {MIN_BYTE_RANGE_WIDTH}, got {}",
                self.byte_range_placeholder_width
            )));
        }
        Ok(())
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> MacResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> MacResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("pdf-mac").join("config.toml"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("pdf-mac-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> MacResult<MacConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = MacConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> MacResult<MacConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            MacError::IoError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: MacConfiguration = toml::from_str(&content).map_err(|e| {
            MacError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &MacConfiguration) -> MacResult<()> {
        config.validate()?;
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MacError::IoError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            MacError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            MacError::IoError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> MacResult<()> {
        let mut config = self.load()?;

        match key {
            "digest_algorithm" => config.digest_algorithm = value.to_string(),
            "mac_algorithm" => config.mac_algorithm = value.to_string(),
            "key_wrap_algorithm" => config.key_wrap_algorithm = value.to_string(),
            "byte_range_placeholder_width" => {
                config.byte_range_placeholder_width = value.parse().map_err(|_| {
                    MacError::ConfigurationError(format!("Invalid width: {value}"))
                })?;
            }
            "default_location" => config.default_location = value.to_string(),
            _ => {
                return Err(MacError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

fn parse_location(value: &str) -> MacResult<MacLocation> {
    match value.trim().to_ascii_lowercase().as_str() {
        "standalone" => Ok(MacLocation::Standalone),
        "attached" | "attachedtosig" | "attached-to-signature" => {
            Ok(MacLocation::AttachedToSignature)
        }
        _ => Err(MacError::ConfigurationError(format!(
            "Invalid MAC location: {value}"
        ))),
    }
}

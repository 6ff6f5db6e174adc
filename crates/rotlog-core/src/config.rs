//! Rotation configuration and config file parsing
//!
//! Config files may be written in:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::{ByteSize, MaxFiles};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Log rotation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Live file size in bytes that forces a rotation before the next write
    pub max_size_bytes: u64,
    /// Maximum number of archives to keep
    pub max_files: MaxFiles,
    /// Gzip archives after rotation
    pub compress: bool,
    /// Gzip level, 0 (store) to 9 (best)
    pub compression_level: u32,
    /// Create missing parent directories when opening the live file
    pub create_parent_dirs: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE,
            max_files: MaxFiles::Unbounded,
            compress: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            create_parent_dirs: false,
        }
    }
}

impl RotationConfig {
    pub fn new(max_size_bytes: u64, max_files: MaxFiles) -> Self {
        Self {
            max_size_bytes,
            max_files,
            ..Self::default()
        }
    }

    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = MaxFiles::Bounded(max_files);
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    /// Check the values a writer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_size_bytes == 0 {
            return Err(Error::config("max_size must be greater than zero"));
        }
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(Error::config(format!(
                "compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            )));
        }
        Ok(())
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected one of {:?}",
                path.display(),
                CONFIG_EXTENSIONS
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => Self::from_toml(content),
            ConfigFormat::Yaml => Self::from_yaml(content),
            ConfigFormat::Json => Self::from_json(content),
        }
    }

    /// Parse TOML config content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RotationFileConfig = toml::from_str(content)?;
        file.into_config()
    }

    /// Parse YAML config content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: RotationFileConfig = serde_yaml::from_str(content)?;
        file.into_config()
    }

    /// Parse JSON config content
    pub fn from_json(content: &str) -> Result<Self> {
        let file: RotationFileConfig = serde_json::from_str(content)?;
        file.into_config()
    }
}

/// Rotation settings as written in a config file; every field is optional
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RotationFileConfig {
    /// Threshold as bytes or a size string ("10MB")
    pub max_size: Option<ByteSize>,
    #[serde(default)]
    pub max_files: MaxFiles,
    pub compress: Option<bool>,
    pub compression_level: Option<u32>,
    #[serde(default)]
    pub create_parent_dirs: bool,
}

impl RotationFileConfig {
    /// Fill in defaults and validate
    pub fn into_config(self) -> Result<RotationConfig> {
        let default = RotationConfig::default();
        let config = RotationConfig {
            max_size_bytes: self
                .max_size
                .map(u64::from)
                .unwrap_or(default.max_size_bytes),
            max_files: self.max_files,
            compress: self.compress.unwrap_or(default.compress),
            compression_level: self
                .compression_level
                .unwrap_or(default.compression_level),
            create_parent_dirs: self.create_parent_dirs,
        };
        config.validate()?;
        Ok(config)
    }
}

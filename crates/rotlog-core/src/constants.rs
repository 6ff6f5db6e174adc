//! Constants and default values for rotlog

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Default rotation threshold in bytes (10MB)
pub const DEFAULT_MAX_SIZE: u64 = 10 * MIB;

/// Default gzip compression level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest gzip compression level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Separator between the live file name and an archive timestamp
pub const ARCHIVE_SEPARATOR: char = '.';

/// Suffix appended to compressed archives
pub const GZIP_SUFFIX: &str = ".gz";

/// Recognized config file extensions
pub const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

//! Error types for rotlog

use std::io;
use std::path::PathBuf;

/// rotlog error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to rotate log file {path}: {source}")]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to compress archive {path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid log path: {0}")]
    InvalidPath(PathBuf),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for rotlog
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Open {
            path: path.into(),
            source,
        }
    }

    pub fn rotate(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Rotate {
            path: path.into(),
            source,
        }
    }

    pub fn compress(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Compress {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error kind, if this error wraps one
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Open { source, .. }
            | Error::Rotate { source, .. }
            | Error::Compress { source, .. }
            | Error::IoError(source) => Some(source.kind()),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IoError(e) => e,
            other => {
                let kind = other.io_kind().unwrap_or(io::ErrorKind::Other);
                io::Error::new(kind, other)
            }
        }
    }
}

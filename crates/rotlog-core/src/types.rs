//! Core types for rotlog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Maximum number of archives retained next to a live log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum MaxFiles {
    /// Keep every archive
    #[default]
    Unbounded,
    /// Keep at most this many archives, newest first
    Bounded(usize),
}

impl MaxFiles {
    /// Retention limit, or `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            MaxFiles::Unbounded => None,
            MaxFiles::Bounded(n) => Some(*n),
        }
    }
}

impl From<Option<usize>> for MaxFiles {
    fn from(value: Option<usize>) -> Self {
        value.map(MaxFiles::Bounded).unwrap_or(MaxFiles::Unbounded)
    }
}

impl From<MaxFiles> for Option<usize> {
    fn from(value: MaxFiles) -> Self {
        value.limit()
    }
}

impl fmt::Display for MaxFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxFiles::Unbounded => write!(f, "unbounded"),
            MaxFiles::Bounded(n) => write!(f, "{}", n),
        }
    }
}

/// A byte count written either as an integer or as a human string ("10MB")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SizeValue", into = "u64")]
pub struct ByteSize(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Bytes(u64),
    Text(String),
}

impl TryFrom<SizeValue> for ByteSize {
    type Error = Error;

    fn try_from(value: SizeValue) -> Result<Self> {
        match value {
            SizeValue::Bytes(n) => Ok(ByteSize(n)),
            SizeValue::Text(s) => s.parse(),
        }
    }
}

impl From<ByteSize> for u64 {
    fn from(value: ByteSize) -> Self {
        value.0
    }
}

impl FromStr for ByteSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_size(s).map(ByteSize)
    }
}

/// Parse size strings like "512", "64K", "10MB", "1GiB" into bytes (binary multiples)
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        return Err(Error::InvalidSize(format!("missing number in '{}'", s)));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidSize(format!("invalid number '{}'", digits)))?;

    let multiplier: u64 = match unit.trim().to_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        other => {
            return Err(Error::InvalidSize(format!(
                "unknown unit '{}' in '{}'",
                other, s
            )))
        }
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidSize(format!("'{}' overflows", s)))
}

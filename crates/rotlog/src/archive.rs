//! Archive naming: `<live name>.<RFC3339 UTC timestamp>[.gz]`

use chrono::{DateTime, SecondsFormat, Utc};
use rotlog_core::{Error, Result, ARCHIVE_SEPARATOR, GZIP_SUFFIX};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A rotated log file found next to the live file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub path: PathBuf,
    /// Rotation instant embedded in the file name
    pub timestamp: DateTime<Utc>,
    pub compressed: bool,
}

/// Format a rotation instant for embedding in a file name.
///
/// Always UTC with nine fractional digits, so every name has the same width
/// and sorts lexicographically in time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Archive path for the live file `path` rotated at `at`
pub fn archive_path(path: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
    let name = live_name(path)?;
    Ok(path.with_file_name(format!(
        "{}{}{}",
        name,
        ARCHIVE_SEPARATOR,
        format_timestamp(at)
    )))
}

/// Compressed sibling of an uncompressed archive
pub fn gzip_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(GZIP_SUFFIX);
    PathBuf::from(name)
}

/// Parse an archive file name belonging to the live file `live_name`.
///
/// Parsed from the right: the optional `.gz` is stripped, then the
/// `<live_name>.` prefix, and whatever remains must be a complete RFC3339
/// timestamp. Returns the timestamp and whether the archive is compressed.
pub fn parse_archive_name(live_name: &str, file_name: &str) -> Option<(DateTime<Utc>, bool)> {
    let (stem, compressed) = match file_name.strip_suffix(GZIP_SUFFIX) {
        Some(stem) => (stem, true),
        None => (file_name, false),
    };

    let ts = stem
        .strip_prefix(live_name)?
        .strip_prefix(ARCHIVE_SEPARATOR)?;

    let parsed = DateTime::parse_from_rfc3339(ts).ok()?;
    Some((parsed.with_timezone(&Utc), compressed))
}

/// List the archives of the live file `path`, newest first.
///
/// Directories, the live file and names that don't parse are skipped. An
/// uncompressed archive whose `.gz` sibling already exists is pending removal
/// and is reported only once, as the compressed archive. Archives with equal
/// timestamps keep directory listing order.
pub fn list_archives(path: &Path) -> Result<Vec<Archive>> {
    let live = live_name(path)?;
    let dir = parent_dir(path);

    let mut candidates = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name == live {
            continue;
        }
        candidates.push(name);
    }

    let names: HashSet<&str> = candidates.iter().map(String::as_str).collect();

    let mut archives: Vec<Archive> = candidates
        .iter()
        .filter_map(|name| {
            let (timestamp, compressed) = parse_archive_name(&live, name)?;
            if !compressed && names.contains(format!("{}{}", name, GZIP_SUFFIX).as_str()) {
                return None;
            }
            Some(Archive {
                path: dir.join(name),
                timestamp,
                compressed,
            })
        })
        .collect();

    archives.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(archives)
}

/// File name of the live log as a string
pub(crate) fn live_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
}

/// Directory holding the live file; "." for a bare file name
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Remove a file, treating "already gone" as success
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

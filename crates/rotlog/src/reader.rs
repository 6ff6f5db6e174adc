//! Reading a rotated log back: its last lines, or its full history

use flate2::read::GzDecoder;
use rotlog_core::{Error, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::archive::{list_archives, Archive};

/// Reader over a live log file and its archives
pub struct LogReader {
    path: PathBuf,
}

impl LogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Last N lines of the history, reading back into the newest archives
    /// only when the live file holds fewer lines
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(vec![]);
        }

        let mut buf = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        // More than n lines means the first of the last n is complete
        if buf.as_slice().lines().count() <= n {
            for archive in self.archives()? {
                let mut older = Vec::new();
                match read_archive(&archive, &mut older) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                }
                older.extend_from_slice(&buf);
                buf = older;

                if buf.as_slice().lines().count() > n {
                    break;
                }
            }
        }

        let mut lines: VecDeque<String> = VecDeque::with_capacity(n + 1);
        for line_result in buf.as_slice().lines() {
            lines.push_back(line_result?);
            if lines.len() > n {
                lines.pop_front();
            }
        }

        Ok(lines.into_iter().collect())
    }

    /// Every byte ever written: archives oldest first (gunzipped), then the live file.
    ///
    /// Archives removed while reading (retention) are skipped.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        let mut archives = self.archives()?;
        archives.reverse();

        for archive in &archives {
            match read_archive(archive, &mut out) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Archive disappeared while reading: {}", archive.path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }

        match File::open(&self.path) {
            Ok(mut live) => {
                live.read_to_end(&mut out)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(out)
    }

    /// Archives newest first; none when the directory itself is missing
    fn archives(&self) -> Result<Vec<Archive>> {
        match list_archives(&self.path) {
            Err(Error::IoError(e)) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
            other => other,
        }
    }

    /// Check if the live file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get live file size
    pub fn size(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

fn read_archive(archive: &Archive, out: &mut Vec<u8>) -> io::Result<usize> {
    let file = File::open(&archive.path)?;
    if archive.compressed {
        GzDecoder::new(file).read_to_end(out)
    } else {
        BufReader::new(file).read_to_end(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{archive_path, gzip_path};
    use crate::rotation::compress_file;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_tail_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.log");
        File::create(&path).unwrap();

        let reader = LogReader::new(path);
        let lines = reader.tail(10).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_tail_nonexistent_file() {
        let reader = LogReader::new("/nonexistent/file.log");
        let lines = reader.tail(10).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_tail_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        {
            let mut file = File::create(&path).unwrap();
            for i in 1..=20 {
                writeln!(file, "Line {}", i).unwrap();
            }
        }

        let reader = LogReader::new(path);
        let lines = reader.tail(5).unwrap();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Line 16");
        assert_eq!(lines[4], "Line 20");
    }

    #[test]
    fn test_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        {
            let mut file = File::create(&path).unwrap();
            file.write_all(b"Hello, world!\n").unwrap();
        }

        let reader = LogReader::new(path);
        assert_eq!(reader.size().unwrap(), 14);
    }

    #[test]
    fn test_read_all_mixes_compressed_and_plain() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("app.log");

        let first = archive_path(&live, Utc.timestamp_opt(1_000, 0).unwrap()).unwrap();
        fs::write(&first, b"first ").unwrap();
        compress_file(&first, 6).unwrap();
        fs::remove_file(&first).unwrap();

        let second = archive_path(&live, Utc.timestamp_opt(2_000, 0).unwrap()).unwrap();
        fs::write(&second, b"second ").unwrap();
        fs::write(&live, b"live").unwrap();

        let reader = LogReader::new(&live);
        assert_eq!(reader.read_all().unwrap(), b"first second live");
    }

    #[test]
    fn test_read_all_without_live_file() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("app.log");

        let reader = LogReader::new(&live);
        assert!(reader.read_all().unwrap().is_empty());
        assert!(!reader.exists());
    }

    #[test]
    fn test_tail_reaches_into_archives() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("app.log");

        let oldest = archive_path(&live, Utc.timestamp_opt(1_000, 0).unwrap()).unwrap();
        fs::write(&oldest, b"a1\na2\n").unwrap();
        let newer = archive_path(&live, Utc.timestamp_opt(2_000, 0).unwrap()).unwrap();
        fs::write(&newer, b"b1\nb2\nb").unwrap();
        compress_file(&newer, 6).unwrap();
        fs::remove_file(&newer).unwrap();
        fs::write(&live, b"3\nc1\n").unwrap();

        let reader = LogReader::new(&live);
        assert_eq!(reader.tail(2).unwrap(), vec!["b3", "c1"]);
        assert_eq!(reader.tail(4).unwrap(), vec!["b1", "b2", "b3", "c1"]);
        assert_eq!(reader.tail(10).unwrap(), vec!["a1", "a2", "b1", "b2", "b3", "c1"]);
        assert!(reader.tail(0).unwrap().is_empty());
    }

    #[test]
    fn test_tail_stops_at_live_file() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("app.log");
        let archive = archive_path(&live, Utc.timestamp_opt(1_000, 0).unwrap()).unwrap();
        // Unreadable as gzip: tail must not need it
        fs::write(gzip_path(&archive), b"not gzip").unwrap();
        fs::write(&live, b"x\ny\nz\n").unwrap();

        let reader = LogReader::new(&live);
        assert_eq!(reader.tail(2).unwrap(), vec!["y", "z"]);
    }
}

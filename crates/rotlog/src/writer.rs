//! Log writer with size-triggered rotation

use parking_lot::Mutex;
use rotlog_core::{Error, Result, RotationConfig};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::archive::{self, Archive};
use crate::cleanup::Cleanup;
use crate::rotation::Rotator;

/// The open handle and the number of bytes it holds
#[derive(Debug, Default)]
pub(crate) struct FileState {
    file: Option<File>,
    size: u64,
}

impl FileState {
    /// Open or create the live file, priming the size from disk.
    /// No-op when already open.
    pub fn open(&mut self, path: &Path, config: &RotationConfig) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        if config.create_parent_dirs {
            let parent = archive::parent_dir(path);
            fs::create_dir_all(&parent).map_err(|e| Error::open(path, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::open(path, e))?;

        // The file may have grown outside this writer's lifetime
        let size = file.metadata().map_err(|e| Error::open(path, e))?.len();

        debug!("Opened {} ({} bytes)", path.display(), size);
        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Release the handle. The handle is gone even when syncing it fails.
    pub fn close(&mut self) -> io::Result<()> {
        self.size = 0;
        match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Single write to the open handle; the size grows by what was persisted
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "log file is closed"))?;
        let n = file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Append-only log sink that rotates its file once it would exceed a size threshold.
///
/// Every operation takes the same lock for its full duration, including the
/// whole rotation sequence, so the writer can be shared across threads
/// (`&RotateWriter` implements [`Write`]). Two writers on the same path are
/// not coordinated.
pub struct RotateWriter {
    path: PathBuf,
    config: RotationConfig,
    state: Mutex<FileState>,
    cleanup: Cleanup,
}

impl RotateWriter {
    /// Create a writer and open (or create) the live file
    pub fn new(path: impl Into<PathBuf>, config: RotationConfig) -> Result<Self> {
        let writer = Self::closed(path, config)?;
        writer.open()?;
        Ok(writer)
    }

    /// Create a writer with default rotation settings and open the live file
    pub fn with_defaults(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(path, RotationConfig::default())
    }

    /// Create a writer without touching the filesystem.
    /// The file is opened by [`RotateWriter::open`] or the first write.
    pub fn closed(path: impl Into<PathBuf>, config: RotationConfig) -> Result<Self> {
        let path = path.into();
        archive::live_name(&path)?;
        config.validate()?;

        Ok(Self {
            path,
            config,
            state: Mutex::new(FileState::default()),
            cleanup: Cleanup::spawn()?,
        })
    }

    /// Open the live file if it isn't already
    pub fn open(&self) -> Result<()> {
        self.state.lock().open(&self.path, &self.config)
    }

    /// Close the live file. Closing a closed writer is a no-op.
    pub fn close(&self) -> Result<()> {
        self.state.lock().close()?;
        Ok(())
    }

    /// Rotate now, returning the archive the live file became (if it existed)
    pub fn rotate(&self) -> Result<Option<PathBuf>> {
        let mut state = self.state.lock();
        self.rotator().rotate(&mut state)
    }

    /// Append bytes, rotating first if they would push the live file past
    /// the threshold. Returns the number of bytes persisted.
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();

        state.open(&self.path, &self.config)?;

        if state.size + buf.len() as u64 > self.config.max_size_bytes {
            self.rotator().rotate(&mut state)?;
        }

        Ok(state.write(buf)?)
    }

    /// Archives of this log, newest first
    pub fn archives(&self) -> Result<Vec<Archive>> {
        archive::list_archives(&self.path)
    }

    /// Block until queued archive deletions have been carried out
    pub fn wait_for_cleanup(&self) {
        self.cleanup.wait();
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Bytes in the live file since it was opened (0 when closed)
    pub fn current_size(&self) -> u64 {
        self.state.lock().size()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_open()
    }

    fn rotator(&self) -> Rotator<'_> {
        Rotator {
            path: &self.path,
            config: &self.config,
            cleanup: &self.cleanup,
        }
    }
}

impl Write for &RotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.append(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().flush()
    }
}

impl Write for RotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl std::fmt::Debug for RotateWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotateWriter")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotlog_core::MaxFiles;
    use tempfile::TempDir;

    fn plain(max_size: u64) -> RotationConfig {
        RotationConfig::new(max_size, MaxFiles::Bounded(10)).with_compress(false)
    }

    #[test]
    fn test_log_writer_creation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::with_defaults(&path).unwrap();
        assert!(path.exists());
        assert!(writer.is_open());
        assert_eq!(writer.current_size(), 0);
    }

    #[test]
    fn test_closed_writer_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::closed(&path, RotationConfig::default()).unwrap();
        assert!(!path.exists());
        assert!(!writer.is_open());
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        let result = RotateWriter::closed("/", RotationConfig::default());
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let result = RotateWriter::closed(dir.path().join("a.log"), plain(0));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_write_tracks_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let mut writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.write_all(b"Hello, ").unwrap();
        writer.write_all(b"world!").unwrap();

        assert_eq!(writer.current_size(), 13);
        assert_eq!(fs::metadata(&path).unwrap().len(), 13);
    }

    #[test]
    fn test_empty_write_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::closed(&path, plain(1024)).unwrap();
        assert_eq!(writer.append(b"").unwrap(), 0);
        assert!(path.exists());
        assert!(writer.is_open());
    }

    #[test]
    fn test_append_on_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        fs::write(&path, b"foo").unwrap();

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        assert_eq!(writer.current_size(), 3);
        writer.append(b"bar").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"foobar");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(!writer.is_open());
        assert_eq!(writer.current_size(), 0);

        // Never opened
        let never = RotateWriter::closed(dir.path().join("other.log"), plain(1024)).unwrap();
        never.close().unwrap();
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.append(b"abc").unwrap();
        writer.open().unwrap();
        assert_eq!(writer.current_size(), 3);
    }

    #[test]
    fn test_write_after_close_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.append(b"one ").unwrap();
        writer.close().unwrap();
        writer.append(b"two").unwrap();

        assert!(writer.is_open());
        assert_eq!(writer.current_size(), 7);
        assert_eq!(fs::read(&path).unwrap(), b"one two");
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("test.log");

        let writer = RotateWriter::closed(&path, plain(1024)).unwrap();
        let err = writer.append(b"data").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(!writer.is_open());
    }

    #[test]
    fn test_create_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("test.log");

        let config = plain(1024).with_create_parent_dirs(true);
        let writer = RotateWriter::new(&path, config).unwrap();
        writer.append(b"hi").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hi");
    }

    #[test]
    fn test_threshold_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(10)).unwrap();
        writer.append(b"12345678").unwrap();
        assert!(writer.archives().unwrap().is_empty());

        writer.append(b"abc").unwrap();
        let archives = writer.archives().unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(fs::read(&archives[0].path).unwrap(), b"12345678");
        assert_eq!(fs::read(&path).unwrap(), b"abc");
        assert_eq!(writer.current_size(), 3);
    }

    #[test]
    fn test_write_exactly_at_threshold_does_not_rotate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(10)).unwrap();
        writer.append(b"12345").unwrap();
        writer.append(b"67890").unwrap();

        assert!(writer.archives().unwrap().is_empty());
        assert_eq!(writer.current_size(), 10);
    }

    #[test]
    fn test_oversized_write_rotates_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(10)).unwrap();
        let payload = b"a payload well beyond ten bytes";
        assert_eq!(writer.append(payload).unwrap(), payload.len());

        let archives = writer.archives().unwrap();
        assert_eq!(archives.len(), 1);
        assert!(fs::read(&archives[0].path).unwrap().is_empty());
        assert_eq!(fs::read(&path).unwrap(), payload);
        assert_eq!(writer.current_size(), payload.len() as u64);
    }

    #[test]
    fn test_manual_rotate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.append(b"before").unwrap();

        let archive = writer.rotate().unwrap().unwrap();
        assert_eq!(fs::read(&archive).unwrap(), b"before");
        assert!(writer.is_open());
        assert_eq!(writer.current_size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_rotate_without_live_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");

        let writer = RotateWriter::closed(&path, plain(1024)).unwrap();
        assert_eq!(writer.rotate().unwrap(), None);
        assert!(path.exists());
        assert!(writer.is_open());
    }

    #[test]
    fn test_rotate_reopen_failure_leaves_writer_closed() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("logs");
        fs::create_dir(&sub).unwrap();
        let path = sub.join("test.log");

        let writer = RotateWriter::new(&path, plain(1024)).unwrap();
        writer.append(b"data").unwrap();

        // Directory vanishes between rotation steps
        fs::remove_dir_all(&sub).unwrap();
        assert!(writer.rotate().is_err());
        assert!(!writer.is_open());

        fs::create_dir(&sub).unwrap();
        writer.open().unwrap();
        assert!(writer.is_open());
        assert_eq!(writer.current_size(), 0);
    }
}

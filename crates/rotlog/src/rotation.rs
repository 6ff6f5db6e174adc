//! Rotation: close, archive, compress, sweep, reopen

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use rotlog_core::{Error, Result, RotationConfig};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::archive::{archive_path, gzip_path, remove_if_exists};
use crate::cleanup::Cleanup;
use crate::retention;
use crate::writer::FileState;

/// Runs the rotation sequence for one live file.
///
/// Callers hold the writer lock for the whole of [`Rotator::rotate`].
pub(crate) struct Rotator<'a> {
    pub path: &'a Path,
    pub config: &'a RotationConfig,
    pub cleanup: &'a Cleanup,
}

impl Rotator<'_> {
    /// Rotate the live file and return the archive it became, if any.
    ///
    /// On error the state is left closed; a later open recovers.
    pub fn rotate(&self, state: &mut FileState) -> Result<Option<PathBuf>> {
        self.rotate_at(state, Utc::now())
    }

    /// Rotate with `at` as the archive timestamp
    fn rotate_at(&self, state: &mut FileState, at: DateTime<Utc>) -> Result<Option<PathBuf>> {
        debug!("Rotating log file: {}", self.path.display());

        state
            .close()
            .map_err(|e| Error::rotate(self.path, e))?;

        let archived = match self.archive(at)? {
            Some(archive) if self.config.compress => Some(self.compress(&archive)?),
            other => other,
        };

        retention::sweep(self.path, self.config.max_files, self.cleanup);

        state.open(self.path, self.config)?;

        match &archived {
            Some(archive) => info!(
                "Rotated {} to {}",
                self.path.display(),
                archive.display()
            ),
            None => debug!("Nothing to archive for {}", self.path.display()),
        }

        Ok(archived)
    }

    /// Rename the live file to its timestamped archive name
    fn archive(&self, at: DateTime<Utc>) -> Result<Option<PathBuf>> {
        match fs::metadata(self.path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::rotate(self.path, e)),
        }

        let archive = archive_path(self.path, at)?;
        if archive.exists() {
            warn!("Archive {} already exists and will be replaced", archive.display());
        }
        fs::rename(self.path, &archive).map_err(|e| Error::rotate(self.path, e))?;
        Ok(Some(archive))
    }

    /// Gzip the archive and hand the uncompressed original to the cleanup worker
    fn compress(&self, archive: &Path) -> Result<PathBuf> {
        let compressed = compress_file(archive, self.config.compression_level)?;
        self.cleanup.remove(vec![archive.to_path_buf()]);
        Ok(compressed)
    }
}

/// Write `<source>.gz` with the same permissions as `source`.
///
/// The source is left in place. A partially written `.gz` is removed on
/// failure so it is never mistaken for a finished archive.
pub fn compress_file(source: &Path, level: u32) -> Result<PathBuf> {
    let dest = gzip_path(source);

    match write_gzip(source, &dest, level) {
        Ok(()) => {
            debug!("Compressed {} to {}", source.display(), dest.display());
            Ok(dest)
        }
        Err(e) => {
            if let Err(cleanup_err) = remove_if_exists(&dest) {
                warn!("Failed to remove partial {}: {}", dest.display(), cleanup_err);
            }
            Err(Error::compress(source, e))
        }
    }
}

fn write_gzip(source: &Path, dest: &Path, level: u32) -> io::Result<()> {
    let mut input = File::open(source)?;
    let permissions = input.metadata()?.permissions();

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(permissions.mode());
    }
    let output = options.open(dest)?;

    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::new(level));
    io::copy(&mut input, &mut encoder)?;
    let output = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    output.sync_all()?;

    // Mode passed at creation is filtered by the umask
    fs::set_permissions(dest, permissions)?;
    Ok(())
}

//! Retention sweep: keep the newest archives, delete the rest

use rotlog_core::{MaxFiles, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::archive::{list_archives, Archive};
use crate::cleanup::Cleanup;

/// Archives of `path` that fall outside the retention limit, oldest last
pub fn expired_archives(path: &Path, max_files: MaxFiles) -> Result<Vec<Archive>> {
    let MaxFiles::Bounded(keep) = max_files else {
        return Ok(Vec::new());
    };

    let mut archives = list_archives(path)?;
    if archives.len() <= keep {
        return Ok(Vec::new());
    }
    Ok(archives.split_off(keep))
}

/// Queue expired archives for deletion. Best effort: a listing failure is
/// logged and ignored, never surfaced to the writer.
pub(crate) fn sweep(path: &Path, max_files: MaxFiles, cleanup: &Cleanup) -> usize {
    if max_files == MaxFiles::Unbounded {
        return 0;
    }

    let expired = match expired_archives(path, max_files) {
        Ok(expired) => expired,
        Err(e) => {
            warn!("Retention sweep skipped for {}: {}", path.display(), e);
            return 0;
        }
    };

    let count = expired.len();
    if count > 0 {
        debug!(
            "Retention: removing {} archive(s) of {} (keeping {})",
            count,
            path.display(),
            max_files
        );
        cleanup.remove(expired.into_iter().map(|a| a.path).collect());
    }
    count
}

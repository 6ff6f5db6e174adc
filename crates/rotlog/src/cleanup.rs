//! Background removal of detached archive files

use crossbeam_channel::{bounded, unbounded, Sender};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::archive::remove_if_exists;

enum Job {
    Remove(Vec<PathBuf>),
    Barrier(Sender<()>),
}

/// Worker thread that deletes files handed to it, in submission order.
///
/// It only touches files that have already been renamed away from the live
/// path, so it never needs the writer's lock.
pub(crate) struct Cleanup {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Cleanup {
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();

        let handle = thread::Builder::new()
            .name("rotlog-cleanup".to_string())
            .spawn(move || {
                for job in rx {
                    match job {
                        Job::Remove(paths) => remove_all(&paths),
                        Job::Barrier(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue files for deletion
    pub fn remove(&self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }

        let Some(tx) = &self.tx else {
            remove_all(&paths);
            return;
        };

        // Worker gone: delete inline so nothing selected is left behind
        if let Err(err) = tx.send(Job::Remove(paths)) {
            if let Job::Remove(paths) = err.into_inner() {
                warn!("Cleanup worker unavailable, removing {} file(s) inline", paths.len());
                remove_all(&paths);
            }
        }
    }

    /// Block until every deletion queued before this call has been attempted
    pub fn wait(&self) {
        let Some(tx) = &self.tx else {
            return;
        };

        let (done_tx, done_rx) = bounded(1);
        if tx.send(Job::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Cleanup worker panicked");
            }
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        match remove_if_exists(path) {
            Ok(true) => debug!("Removed {}", path.display()),
            Ok(false) => debug!("Already removed: {}", path.display()),
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

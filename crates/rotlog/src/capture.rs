//! Async capture of a byte stream (e.g. child stdout) into a rotating log

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};

use crate::writer::RotateWriter;

/// Spawn a task copying `reader` line by line into `writer`.
///
/// Lines are written whole, newline included, so a rotation never splits one.
/// Each write runs on the blocking pool, since it may carry a full rotation
/// (fsync, gzip). Write failures are logged and the line is dropped; the task
/// ends at EOF or on a read error. Resolves to the number of bytes written.
pub fn spawn_capture<R>(reader: R, writer: Arc<RotateWriter>) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut captured = 0u64;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let mut data = line.into_bytes();
                    data.push(b'\n');

                    let sink = Arc::clone(&writer);
                    let written = task::spawn_blocking(move || {
                        (&*sink).write_all(&data).map(|()| data.len() as u64)
                    })
                    .await;

                    match written {
                        Ok(Ok(n)) => captured += n,
                        Ok(Err(e)) => warn!("Failed to write to {}: {}", writer.path().display(), e),
                        Err(e) => warn!("Capture write task failed: {}", e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Capture ended: {}", e);
                    break;
                }
            }
        }

        captured
    })
}

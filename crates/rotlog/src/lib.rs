//! rotlog - Size-triggered rotating log writer
//!
//! [`RotateWriter`] appends to a live file and, once a write would push it
//! past the configured threshold, renames it to `<path>.<RFC3339 timestamp>`,
//! optionally gzips it, prunes archives beyond the retention count and
//! continues in a fresh file.

pub mod archive;
pub mod capture;
mod cleanup;
pub mod reader;
pub mod retention;
mod rotation;
mod writer;

pub use archive::{list_archives, parse_archive_name, Archive};
pub use capture::spawn_capture;
pub use reader::LogReader;
pub use rotation::compress_file;
pub use rotlog_core::{ByteSize, ConfigFormat, Error, MaxFiles, Result, RotationConfig};
pub use writer::RotateWriter;

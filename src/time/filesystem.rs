//! File system modification time, the reader of last resort

use super::{FileEntry, ReadOutcome, TimeSource, TimestampReader};
use chrono::{DateTime, Local};
use std::path::Path;

/// Uses the last modification time reported by the file system
///
/// File creation time would be closer to the capture time but is not
/// portable; at best either one reflects the upload time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemReader;

impl TimestampReader for FileSystemReader {
    fn read_timestamp(&self, _dir: &Path, file: &FileEntry) -> ReadOutcome {
        match file.modified {
            Some(modified) => {
                let local: DateTime<Local> = modified.into();
                ReadOutcome::Resolved(local.naive_local())
            }
            None => ReadOutcome::Failed("no file modification time available".to_string()),
        }
    }

    fn source(&self) -> TimeSource {
        TimeSource::FileSystem
    }
}

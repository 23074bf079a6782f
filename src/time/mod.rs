//! Time extraction module
//!
//! This module resolves the capture time of a media file by trying a fixed
//! list of readers in order:
//! - EXIF metadata in JPEG images
//! - Filename patterns written by cloud sync clients and phone cameras
//! - File system modification time
//!
//! The first reader that resolves a time wins. Readers that apply to a file
//! but fail to produce a time leave a diagnostic behind; if nothing resolves,
//! those diagnostics are joined into the returned error.

pub mod exif;
pub mod filename;
pub mod filesystem;

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

pub use self::exif::ExifReader;
pub use self::filename::FileNameReader;
pub use self::filesystem::FileSystemReader;

/// Source of the extracted timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Extracted from EXIF metadata
    Exif,
    /// Parsed from filename
    Filename,
    /// From file system modification time
    FileSystem,
}

impl TimeSource {
    /// Short tag used in progress logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSource::Exif => "exif",
            TimeSource::Filename => "name",
            TimeSource::FileSystem => "mtime",
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved capture time for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    /// Our best guess at the time this media was taken (local wall clock)
    pub time: NaiveDateTime,
    /// Reader that produced the time
    pub source: TimeSource,
}

/// The part of a directory entry the readers look at
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File name without any directory component
    pub name: String,
    /// Last modification time, if the file system reports one
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, modified: Option<SystemTime>) -> Self {
        Self {
            name: name.into(),
            modified,
        }
    }

    /// Build an entry from a listed directory entry
    pub fn from_dir_entry(entry: &walkdir::DirEntry) -> Result<Self> {
        let metadata = entry.metadata()?;
        Ok(Self {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Outcome of a single reader attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The reader produced a capture time
    Resolved(NaiveDateTime),
    /// The reader does not handle this kind of file
    NotApplicable,
    /// The reader handles this kind of file but could not produce a time
    Failed(String),
}

/// A strategy for deriving the capture time of a file
pub trait TimestampReader {
    /// Try to read the capture time of `file` located in `dir`
    fn read_timestamp(&self, dir: &Path, file: &FileEntry) -> ReadOutcome;

    /// Tag identifying this reader
    fn source(&self) -> TimeSource;
}

/// Readers in priority order
pub fn default_readers() -> [&'static dyn TimestampReader; 3] {
    [&ExifReader, &FileNameReader, &FileSystemReader]
}

/// Resolve the capture time of a file using the default readers
pub fn resolve_timestamp(dir: &Path, file: &FileEntry) -> Result<MediaInfo> {
    resolve_with(&default_readers(), dir, file)
}

/// Resolve the capture time of a file, trying `readers` in order
///
/// The first `Resolved` outcome is returned. `Failed` outcomes are collected
/// and become the error message if no reader resolves.
pub fn resolve_with(
    readers: &[&dyn TimestampReader],
    dir: &Path,
    file: &FileEntry,
) -> Result<MediaInfo> {
    let mut diagnostics = String::new();

    for reader in readers {
        match reader.read_timestamp(dir, file) {
            ReadOutcome::Resolved(time) => {
                if !diagnostics.is_empty() {
                    warn!(
                        file = %file.name,
                        source = %reader.source(),
                        diagnostics = diagnostics.trim_start_matches(": "),
                        "Earlier readers failed before time was resolved"
                    );
                }
                return Ok(MediaInfo {
                    time,
                    source: reader.source(),
                });
            }
            ReadOutcome::NotApplicable => {
                debug!(file = %file.name, source = %reader.source(), "Reader not applicable");
            }
            ReadOutcome::Failed(message) => {
                debug!(file = %file.name, source = %reader.source(), %message, "Reader failed");
                diagnostics.push_str(": ");
                diagnostics.push_str(&message);
            }
        }
    }

    Err(Error::TimestampUnresolved {
        path: dir.join(&file.name),
        message: diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    struct Fixed {
        outcome: ReadOutcome,
        source: TimeSource,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn new(outcome: ReadOutcome, source: TimeSource) -> Self {
            Self {
                outcome,
                source,
                calls: Cell::new(0),
            }
        }
    }

    impl TimestampReader for Fixed {
        fn read_timestamp(&self, _dir: &Path, _file: &FileEntry) -> ReadOutcome {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }

        fn source(&self) -> TimeSource {
            self.source
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_time_source_tags() {
        assert_eq!(TimeSource::Exif.as_str(), "exif");
        assert_eq!(TimeSource::Filename.as_str(), "name");
        assert_eq!(TimeSource::FileSystem.to_string(), "mtime");
    }

    #[test]
    fn test_first_resolved_wins() {
        let first = Fixed::new(ReadOutcome::NotApplicable, TimeSource::Exif);
        let second = Fixed::new(
            ReadOutcome::Resolved(at(2020, 1, 2, 3, 4, 5)),
            TimeSource::Filename,
        );
        let third = Fixed::new(
            ReadOutcome::Resolved(at(1999, 1, 1, 0, 0, 0)),
            TimeSource::FileSystem,
        );

        let file = FileEntry::new("a.jpg", None);
        let info = resolve_with(&[&first, &second, &third], Path::new("."), &file).unwrap();

        assert_eq!(info.time, at(2020, 1, 2, 3, 4, 5));
        assert_eq!(info.source, TimeSource::Filename);
        assert_eq!(third.calls.get(), 0);
    }

    #[test]
    fn test_failure_does_not_stop_cascade() {
        let first = Fixed::new(ReadOutcome::Failed("bad exif".into()), TimeSource::Exif);
        let second = Fixed::new(
            ReadOutcome::Resolved(at(2020, 1, 2, 3, 4, 5)),
            TimeSource::FileSystem,
        );

        let file = FileEntry::new("a.jpg", None);
        let info = resolve_with(&[&first, &second], Path::new("."), &file).unwrap();
        assert_eq!(info.source, TimeSource::FileSystem);
    }

    #[test]
    fn test_all_failed_collects_messages() {
        let first = Fixed::new(ReadOutcome::Failed("first".into()), TimeSource::Exif);
        let second = Fixed::new(ReadOutcome::NotApplicable, TimeSource::Filename);
        let third = Fixed::new(ReadOutcome::Failed("third".into()), TimeSource::FileSystem);

        let file = FileEntry::new("a.jpg", None);
        let err = resolve_with(&[&first, &second, &third], Path::new("dir"), &file).unwrap_err();

        match err {
            Error::TimestampUnresolved { path, message } => {
                assert_eq!(path, Path::new("dir").join("a.jpg"));
                assert_eq!(message, ": first: third");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nothing_applicable_has_empty_message() {
        let only = Fixed::new(ReadOutcome::NotApplicable, TimeSource::Filename);
        let file = FileEntry::new("a.mov", None);
        let err = resolve_with(&[&only], Path::new("."), &file).unwrap_err();
        assert!(matches!(err, Error::TimestampUnresolved { ref message, .. } if message.is_empty()));
    }

    #[test]
    fn test_default_order_falls_back_to_name_for_corrupt_jpeg() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("IMG_20210815_101500.jpg"), b"not a jpeg").unwrap();

        let file = FileEntry::new("IMG_20210815_101500.jpg", Some(SystemTime::now()));
        let info = resolve_timestamp(dir.path(), &file).unwrap();

        assert_eq!(info.source, TimeSource::Filename);
        assert_eq!(info.time, at(2021, 8, 15, 10, 15, 0));
    }

    #[test]
    fn test_default_order_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("holiday.mov"), b"movie").unwrap();

        let modified = SystemTime::now();
        let file = FileEntry::new("holiday.mov", Some(modified));
        let info = resolve_timestamp(dir.path(), &file).unwrap();

        assert_eq!(info.source, TimeSource::FileSystem);
    }

    #[test]
    fn test_default_order_unresolvable_without_mtime() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.jpg"), b"garbage").unwrap();

        let file = FileEntry::new("broken.jpg", None);
        let err = resolve_timestamp(dir.path(), &file).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("broken.jpg"));
        assert!(message.contains("exif"));
        assert!(message.contains("no file modification time available"));
    }
}

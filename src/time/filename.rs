//! Filename timestamp parsing

use super::{FileEntry, ReadOutcome, TimeSource, TimestampReader};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::trace;

/// A naming convention that encodes the capture time at the start of the name
struct NamePattern {
    /// Matches the date-time prefix of a lower-cased filename
    prefix: Regex,
    /// chrono format for the matched prefix
    format: &'static str,
}

static NAME_PATTERNS: OnceLock<Vec<NamePattern>> = OnceLock::new();

/// Initialize NAME_PATTERNS on first use
fn get_name_patterns() -> &'static Vec<NamePattern> {
    NAME_PATTERNS.get_or_init(|| {
        vec![
            // Dropbox camera uploads: "2019-02-10 08.00.01.jpg"
            NamePattern {
                prefix: Regex::new(r"^\d{4}-\d\d-\d\d \d\d\.\d\d\.\d\d").unwrap(),
                format: "%Y-%m-%d %H.%M.%S",
            },
            // Pixel and other Android cameras
            NamePattern {
                prefix: Regex::new(r"^vid_\d{8}_\d{6}").unwrap(),
                format: "vid_%Y%m%d_%H%M%S",
            },
            NamePattern {
                prefix: Regex::new(r"^img_\d{8}_\d{6}").unwrap(),
                format: "img_%Y%m%d_%H%M%S",
            },
            NamePattern {
                prefix: Regex::new(r"^pano_\d{8}_\d{6}").unwrap(),
                format: "pano_%Y%m%d_%H%M%S",
            },
        ]
    })
}

/// Reads the capture time from well-known upload and camera file names
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNameReader;

impl TimestampReader for FileNameReader {
    fn read_timestamp(&self, _dir: &Path, file: &FileEntry) -> ReadOutcome {
        match parse_filename_time(&file.name) {
            Some(time) => ReadOutcome::Resolved(time),
            None => ReadOutcome::NotApplicable,
        }
    }

    fn source(&self) -> TimeSource {
        TimeSource::Filename
    }
}

/// Parse the timestamp prefix of a filename, if it follows a known convention
///
/// The time is taken literally as local wall-clock time.
pub fn parse_filename_time(filename: &str) -> Option<NaiveDateTime> {
    let name = filename.to_lowercase();

    get_name_patterns().iter().find_map(|pattern| {
        let matched = pattern.prefix.find(&name)?;
        let time = NaiveDateTime::parse_from_str(matched.as_str(), pattern.format).ok()?;
        trace!(filename, format = pattern.format, "Matched filename pattern");
        Some(time)
    })
}

//! EXIF time extraction for JPEG images

use super::{FileEntry, ReadOutcome, TimeSource, TimestampReader};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF tags to try for date extraction, in priority order
const DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal, // When the original image was taken
    Tag::DateTime,         // File modification date/time
];

/// Reads the capture time embedded in JPEG files
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl TimestampReader for ExifReader {
    fn read_timestamp(&self, dir: &Path, file: &FileEntry) -> ReadOutcome {
        if !is_jpeg(&file.name) {
            return ReadOutcome::NotApplicable;
        }
        let path = dir.join(&file.name);
        match extract_exif_time(&path) {
            Ok(time) => ReadOutcome::Resolved(time),
            Err(message) => ReadOutcome::Failed(format!("{} : {}", path.display(), message)),
        }
    }

    fn source(&self) -> TimeSource {
        TimeSource::Exif
    }
}

/// Whether the name carries a JPEG extension
fn is_jpeg(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Extract creation time from EXIF metadata
fn extract_exif_time(path: &Path) -> Result<NaiveDateTime, String> {
    let file = File::open(path).map_err(|e| format!("failed to open file: {e}"))?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| format!("failed to extract exif date: {e}"))?;

    for tag in DATE_TAGS {
        if let Some(field) = exif.get_field(*tag, In::PRIMARY) {
            let raw = match field.value {
                Value::Ascii(ref values) => values
                    .first()
                    .map(|v| String::from_utf8_lossy(v).into_owned()),
                _ => None,
            };
            if let Some(datetime) = raw.as_deref().and_then(parse_exif_datetime) {
                trace!(?path, ?tag, "Found EXIF date");
                return Ok(datetime);
            }
        }
    }

    Err("failed to extract exif date: no valid date tag".to_string())
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"').trim_end_matches('\0');

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

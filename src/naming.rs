//! Destination naming
//!
//! Files land under `<root>/<year>/<year>-<MM> <Month>` and are renamed to
//! `<prefix><YYYY_MM_DD_HHMMSS><.ext>`, where the prefix is `img_` for images,
//! `vid_` for videos and empty otherwise. The original base name is dropped.

use crate::time::MediaInfo;
use chrono::Datelike;
use std::path::{Path, PathBuf};

/// Recognised image extensions (lower case, without dot)
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "gif"];

/// Recognised video extensions (lower case, without dot)
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mpg", "mp4"];

/// Kind of media, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Classify a file name by its extension (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
            return MediaKind::Other;
        };
        let ext = ext.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Prefix for the generated file name
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "img_",
            MediaKind::Video => "vid_",
            MediaKind::Other => "",
        }
    }
}

/// Whether the file is an image or video this tool organises
pub fn is_supported(name: &str) -> bool {
    MediaKind::from_name(name) != MediaKind::Other
}

/// Files that are silently ignored: hidden files and desktop.ini style files
pub fn should_skip(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') {
        return true;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ini"))
}

/// Directory under `root` that holds media taken at `info.time`
pub fn destination_dir(root: &Path, info: &MediaInfo) -> PathBuf {
    let year = info.time.year();
    root.join(year.to_string())
        .join(info.time.format("%Y-%m %B").to_string())
}

/// New file name for `original`, derived from the resolved time
pub fn destination_file_name(original: &str, info: &MediaInfo) -> String {
    let prefix = MediaKind::from_name(original).prefix();
    let suffix = Path::new(original)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{}{}{}", prefix, info.time.format("%Y_%m_%d_%H%M%S"), suffix)
}

/// Full destination path for `original` under `root`
pub fn destination_path(root: &Path, original: &str, info: &MediaInfo) -> PathBuf {
    destination_dir(root, info).join(destination_file_name(original, info))
}

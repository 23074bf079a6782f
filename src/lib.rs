//! Media Organiser - copy photos and videos into a date-structured library
//!
//! This library provides functionality for organising media files by
//! capture time with support for:
//! - EXIF metadata extraction for JPEG images
//! - Filename timestamp parsing for cloud uploads and phone cameras
//! - File system modification time as a last resort
//! - Copies that never overwrite, with content-identical files skipped
//! - Optional archival of originals after copying

pub mod cli;
pub mod config;
pub mod copy;
pub mod error;
pub mod naming;
pub mod process;
pub mod time;

pub use cli::Cli;
pub use config::{Config, ConfigError, SourceConfig};
pub use copy::{CopyDecision, CopyOutcome, copy_file, plan_destination};
pub use error::{Error, Result};
pub use naming::MediaKind;
pub use process::Processor;
pub use time::{MediaInfo, TimeSource, resolve_timestamp};

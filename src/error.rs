//! Error types for the media organiser

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for media organiser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the media organiser
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot extract date for {path}{message}")]
    TimestampUnresolved { path: PathBuf, message: String },

    #[error("Failed to copy to {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create archive directory {path}: {source}")]
    ArchiveCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    ArchiveMove {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory listing error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    /// Wrap an I/O failure that happened while writing or probing `path`
    pub(crate) fn copy(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Copy {
            path: path.into(),
            source,
        }
    }
}

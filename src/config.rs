//! Configuration types for the media organiser

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name used for the log file and the run banner
pub const APPLICATION_NAME: &str = "media-organiser";

/// One directory to organise and the library roots its files are copied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory scanned (non-recursively) for media files
    pub source: PathBuf,

    /// Library roots. Files are arranged by date under each one, e.g.
    /// `<root>/2019/2019-02 February`
    pub destinations: Vec<PathBuf>,
}

/// Configuration for the media organiser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Source directories with their destinations
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Optional location originals are moved into once copied.
    /// Each run gets its own timestamped subdirectory; file names are kept.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,

    /// Directory for the log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Dry run mode - decide destinations but don't copy or move anything
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Check that there is something to do
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "no source directories configured".to_string(),
            ));
        }
        for source in &self.sources {
            if source.destinations.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has no destinations",
                    source.source.display()
                )));
            }
        }
        Ok(())
    }

    /// Directory the log file is written to
    ///
    /// Falls back to `$LOGDIR`, then `$TEMP`, then the OS temp directory.
    pub fn resolve_log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        ["LOGDIR", "TEMP"]
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .find(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Full path of the log file
    pub fn log_file_path(&self) -> PathBuf {
        self.resolve_log_dir()
            .join(format!("{APPLICATION_NAME}.log"))
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Media Organiser Configuration File
# This file uses TOML format (https://toml.io)

# Optional: originals are moved here after they have been copied to every
# destination. Each run creates a subdirectory named after its start time.
archive_dir = "D:/Backups/Photos"

# Optional: where media-organiser.log is written.
# Defaults to $LOGDIR, then $TEMP, then the system temp directory.
# log_dir = "D:/Logs"

# Dry run mode - show what would be done without actually doing it
dry_run = false

# Each source directory is scanned (not recursively) and its photos and
# videos are copied under every destination, arranged as
#   <destination>/2019/2019-02 February/img_2019_02_10_080001.jpg
[[sources]]
source = "D:/Dropbox/Camera Uploads"
destinations = ["D:/Dropbox/Shared/Pictures/Album"]

[[sources]]
source = "D:/OneDrive/Pictures/Camera Roll"
destinations = [
    "D:/Drive/Photo Uploads",
    "D:/OneDrive/Shared/Photo Album",
]
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError { source: toml::ser::Error },
    /// Configuration is well-formed but unusable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
            ConfigError::Invalid(message) => write!(f, "Invalid configuration: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].destinations.len(), 2);
        assert_eq!(config.archive_dir, Some(PathBuf::from("D:/Backups/Photos")));
        assert!(config.log_dir.is_none());
        assert!(!config.dry_run);
        config.validate().unwrap();
    }

    #[test]
    fn test_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [[sources]]
            source = "in"
            destinations = ["out"]
            "#,
        )
        .unwrap();
        assert!(config.archive_dir.is_none());
        assert_eq!(config.sources[0].source, PathBuf::from("in"));
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            Config::default().validate(),
            Err(ConfigError::Invalid(_))
        ));

        let config = Config {
            sources: vec![SourceConfig {
                source: "in".into(),
                destinations: vec![],
            }],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("has no destinations"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config {
            sources: vec![SourceConfig {
                source: "in".into(),
                destinations: vec!["a".into(), "b".into()],
            }],
            archive_dir: Some("archive".into()),
            log_dir: None,
            dry_run: true,
        };
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = Config::load_from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
        assert!(err.to_string().contains("missing.toml"));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "sources = 3").unwrap();
        assert!(matches!(
            Config::load_from_file(&bad),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_explicit_log_dir() {
        let config = Config {
            log_dir: Some("/var/log/photos".into()),
            ..Config::default()
        };
        assert_eq!(
            config.log_file_path(),
            PathBuf::from("/var/log/photos/media-organiser.log")
        );
    }
}

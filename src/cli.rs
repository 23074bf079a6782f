//! CLI argument parsing with clap

use crate::config::{Config, SourceConfig};
use clap::Parser;
use std::path::PathBuf;

/// Media Organiser - copy photos and videos into a dated library
///
/// Each file's capture time is taken from EXIF data, a known filename
/// pattern, or the file modification time, in that order. Files are copied
/// to `<destination>/<year>/<year>-<MM> <Month>/` and renamed after that
/// time. Existing files are never overwritten.
#[derive(Parser, Debug, Default)]
#[command(name = "media-organiser")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// CLI arguments override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Source directory to organise (replaces the configured sources)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination library roots for --source
    #[arg(short, long = "dest", num_args = 1..)]
    pub destinations: Vec<PathBuf>,

    /// Move originals into a timestamped subdirectory of this directory
    #[arg(short, long, env = "MEDIA_ORGANISER_ARCHIVE")]
    pub archive: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub sample_config: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source {
            config.sources = vec![SourceConfig {
                source: source.clone(),
                destinations: self.destinations.clone(),
            }];
        } else if !self.destinations.is_empty() {
            for source in &mut config.sources {
                source.destinations = self.destinations.clone();
            }
        }
        if let Some(ref archive) = self.archive {
            config.archive_dir = Some(archive.clone());
        }
        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        if self.dry_run {
            config.dry_run = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

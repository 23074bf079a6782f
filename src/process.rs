//! Directory processing
//!
//! Handles the per-run logic of:
//! - Listing each source directory (non-recursively, in name order)
//! - Filtering out ignored and unsupported files
//! - Resolving capture times
//! - Copying files into every destination library
//! - Moving originals into the archive directory

use crate::config::{APPLICATION_NAME, Config, SourceConfig};
use crate::copy::{CopyDecision, CopyOutcome, copy_file, plan_destination, suffixed_path};
use crate::error::{Error, Result};
use crate::naming::{destination_path, is_supported, should_skip};
use crate::time::{FileEntry, MediaInfo, resolve_timestamp};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Resolved capture time
    pub media: Option<MediaInfo>,
    /// Processing status
    pub status: FileStatus,
    /// One entry per destination root, in configuration order
    pub destinations: Vec<DestinationResult>,
    /// Where the original was moved to, if archived
    pub archived_to: Option<PathBuf>,
    /// Error message (if the file could not be handled at all)
    pub error: Option<String>,
}

impl FileResult {
    fn new(source: PathBuf, status: FileStatus) -> Self {
        Self {
            source,
            media: None,
            status,
            destinations: Vec::new(),
            archived_to: None,
            error: None,
        }
    }
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Every destination holds the file
    Success,
    /// Not an image or video
    Unsupported,
    /// No reader could produce a capture time
    Unresolved,
    /// At least one destination failed
    Failed,
    /// Dry run - destinations were decided only
    DryRun,
}

/// Outcome for one destination root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationResult {
    /// Path derived from the naming rules, before conflict handling
    pub requested: PathBuf,
    pub outcome: DestinationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationOutcome {
    /// The copy engine ran
    Done(CopyOutcome),
    /// Dry run decision
    Planned(CopyDecision),
    /// The copy failed; `path` is the last path attempted
    Failed { path: PathBuf, message: String },
}

impl DestinationOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, DestinationOutcome::Failed { .. })
    }
}

/// Processing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub processed: usize,
    pub copied: usize,
    pub identical: usize,
    pub ignored: usize,
    pub unsupported: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub archived: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Processed: {}, Copied: {}, Identical: {}, Unsupported: {}, Unresolved: {}, Failed: {}, Archived: {}",
            self.total_files,
            self.processed,
            self.copied,
            self.identical,
            self.unsupported,
            self.unresolved,
            self.failed,
            self.archived
        )
    }
}

/// Archive directory for one source directory run
///
/// The timestamped directory is created on the first move only, so runs that
/// archive nothing leave no trace. Every source of a run shares the same
/// stamp, and an original never replaces one already archived there.
#[derive(Debug)]
struct ArchiveState<'a> {
    run_dir: PathBuf,
    stamp: &'a str,
    created: bool,
}

impl<'a> ArchiveState<'a> {
    fn new(root: &Path, stamp: &'a str) -> Self {
        Self {
            run_dir: root.join(stamp),
            stamp,
            created: false,
        }
    }

    fn run_dir(&mut self) -> Result<&Path> {
        if !self.created {
            fs::create_dir_all(&self.run_dir).map_err(|e| Error::ArchiveCreate {
                path: self.run_dir.clone(),
                source: e,
            })?;
            info!(archive_dir = %self.run_dir.display(), stamp = self.stamp, "Created archive directory for original files");
            self.created = true;
        }
        Ok(&self.run_dir)
    }

    fn archive(&mut self, source: &Path, name: &str) -> Result<PathBuf> {
        let wanted = self.run_dir()?.join(name);
        let mut target = wanted.clone();
        let mut suffix = 0;
        while fs::symlink_metadata(&target).is_ok() {
            suffix += 1;
            target = suffixed_path(&wanted, suffix);
        }
        if suffix > 0 {
            warn!(from = %source.display(), to = %target.display(), "Archive already holds a file with this name, renaming");
        }
        fs::rename(source, &target).map_err(|e| Error::ArchiveMove {
            from: source.to_path_buf(),
            to: target.clone(),
            source: e,
        })?;
        Ok(target)
    }
}

/// Name of the per-run archive directory
fn run_stamp() -> String {
    Local::now().format("%Y-%m-%d_%H%M%S").to_string()
}

/// Main processor for organizing media files
pub struct Processor {
    config: Config,
    stats: ProcessingStats,
    run_stamp: String,
}

impl Processor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: ProcessingStats::new(),
            run_stamp: run_stamp(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Process every configured source directory in turn
    ///
    /// Per-file problems are recorded in the results. Archive failures abort
    /// the run.
    pub fn run(&mut self) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "processor_run").entered();
        self.run_stamp = run_stamp();

        let sources = self.config.sources.clone();
        let mut results = Vec::new();
        for source in &sources {
            results.extend(self.process_directory(source)?);
        }

        info!("{}", self.stats.summary());
        info!("DONE");
        Ok(results)
    }

    /// Process the files directly inside one source directory
    pub fn process_directory(&mut self, source: &SourceConfig) -> Result<Vec<FileResult>> {
        let src_dir = &source.source;
        info!(
            "**** Running {} against directory {} ****",
            APPLICATION_NAME,
            src_dir.display()
        );

        if !src_dir.is_dir() {
            warn!(?src_dir, "Source directory does not exist, skipping");
            return Ok(Vec::new());
        }

        let archive_root = self.config.archive_dir.clone();
        let stamp = self.run_stamp.clone();
        let mut archive = archive_root
            .as_deref()
            .map(|root| ArchiveState::new(root, &stamp));
        let mut results = Vec::new();

        for entry in WalkDir::new(src_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The source directory itself could not be read
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    let path = e.path().map_or_else(|| src_dir.clone(), Path::to_path_buf);
                    if path
                        .file_name()
                        .is_some_and(|name| should_skip(&name.to_string_lossy()))
                    {
                        self.stats.ignored += 1;
                        continue;
                    }
                    results.push(self.unreadable(path, e.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let file = match FileEntry::from_dir_entry(&entry) {
                Ok(file) => file,
                Err(e) => {
                    results.push(self.unreadable(entry.into_path(), e.to_string()));
                    continue;
                }
            };
            if let Some(result) =
                self.process_file(src_dir, &file, &source.destinations, archive.as_mut())?
            {
                results.push(result);
            }
        }

        Ok(results)
    }

    /// Record an entry that could not even be inspected
    fn unreadable(&mut self, path: PathBuf, message: String) -> FileResult {
        error!(path = %path.display(), error = %message, "SKIPPING file: cannot read directory entry");
        self.stats.total_files += 1;
        self.stats.failed += 1;
        let mut result = FileResult::new(path, FileStatus::Failed);
        result.error = Some(message);
        result
    }

    fn process_file(
        &mut self,
        src_dir: &Path,
        file: &FileEntry,
        destinations: &[PathBuf],
        archive: Option<&mut ArchiveState<'_>>,
    ) -> Result<Option<FileResult>> {
        if should_skip(&file.name) {
            debug!(file = %file.name, "Ignoring file");
            self.stats.ignored += 1;
            return Ok(None);
        }

        let source_path = src_dir.join(&file.name);
        let _file_span = span!(Level::DEBUG, "process_file", file = %file.name).entered();
        self.stats.total_files += 1;

        if !is_supported(&file.name) {
            info!(path = %source_path.display(), "SKIPPING file: unsupported file type");
            self.stats.unsupported += 1;
            return Ok(Some(FileResult::new(source_path, FileStatus::Unsupported)));
        }

        let media = match resolve_timestamp(src_dir, file) {
            Ok(media) => media,
            Err(e) => {
                error!(path = %source_path.display(), error = %e, "SKIPPING file: cannot extract date");
                self.stats.unresolved += 1;
                let mut result = FileResult::new(source_path, FileStatus::Unresolved);
                result.error = Some(e.to_string());
                return Ok(Some(result));
            }
        };

        let mut result = FileResult::new(source_path.clone(), FileStatus::Success);
        result.media = Some(media);

        for root in destinations {
            let dest = destination_path(root, &file.name, &media);
            info!(
                "[{}] {} => {} ({})",
                media.source,
                source_path.display(),
                dest.display(),
                media.time
            );
            let outcome = self.copy_to(&source_path, &dest);
            result.destinations.push(DestinationResult {
                requested: dest,
                outcome,
            });
        }

        if result.destinations.iter().any(|d| d.outcome.is_failure()) {
            result.status = FileStatus::Failed;
            self.stats.failed += 1;
            if archive.is_some() && !self.config.dry_run {
                warn!(path = %source_path.display(), "Leaving original in place after failed copy");
            }
            return Ok(Some(result));
        }

        if self.config.dry_run {
            result.status = FileStatus::DryRun;
            self.stats.processed += 1;
            return Ok(Some(result));
        }

        self.stats.processed += 1;
        if let Some(archive) = archive {
            let archived = archive.archive(&source_path, &file.name)?;
            debug!(from = %source_path.display(), to = %archived.display(), "Archived original");
            self.stats.archived += 1;
            result.archived_to = Some(archived);
        }

        Ok(Some(result))
    }

    /// Copy one file to one destination, containing any failure
    fn copy_to(&mut self, source: &Path, dest: &Path) -> DestinationOutcome {
        if self.config.dry_run {
            return match plan_destination(source, dest) {
                Ok(decision) => {
                    info!(?decision, "Dry run: nothing copied");
                    DestinationOutcome::Planned(decision)
                }
                Err(e) => failed(dest, e),
            };
        }

        match copy_file(source, dest) {
            Ok(outcome) => {
                match &outcome {
                    CopyOutcome::Copied { dest, suffix } => {
                        self.stats.copied += 1;
                        if let Some(suffix) = suffix {
                            info!(dest = %dest.display(), suffix, "Copied under a new name to avoid overwriting a different file");
                        }
                    }
                    CopyOutcome::Identical(existing) => {
                        self.stats.identical += 1;
                        info!(existing = %existing.display(), "Identical file already present");
                    }
                    CopyOutcome::SamePath(_) => {}
                }
                DestinationOutcome::Done(outcome)
            }
            Err(e) => failed(dest, e),
        }
    }
}

fn failed(dest: &Path, e: Error) -> DestinationOutcome {
    let path = match &e {
        Error::Copy { path, .. } => path.clone(),
        _ => dest.to_path_buf(),
    };
    error!(path = %path.display(), error = %e, "FAILED copy");
    DestinationOutcome::Failed {
        path,
        message: e.to_string(),
    }
}

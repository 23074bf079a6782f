//! Conflict-safe file copy
//!
//! A file is never overwritten. When the desired destination already holds a
//! file, the contents are compared: identical files are left alone, and
//! different files push the copy to `name_1.ext`, `name_2.ext`, ... until a
//! free slot or an identical file is found.
//!
//! Contents are compared whole, in memory. Media files are expected to fit
//! comfortably; a size check runs first so most mismatches never read data.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Where a copy would go, decided before anything is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyDecision {
    /// An identical file is already present at this path
    SkipIdentical(PathBuf),
    /// The desired path is free
    CopyTo(PathBuf),
    /// The desired path is taken by a different file; use the suffixed path
    CopyToDisambiguated { path: PathBuf, suffix: u32 },
}

/// What `copy_file` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Source and destination are the same path; nothing to do
    SamePath(PathBuf),
    /// An identical file was already present at this path
    Identical(PathBuf),
    /// The file was copied to `dest`, with a numeric suffix if one was needed
    Copied { dest: PathBuf, suffix: Option<u32> },
}

impl CopyOutcome {
    /// Path the file now lives at in the destination tree
    pub fn path(&self) -> &Path {
        match self {
            CopyOutcome::SamePath(path) | CopyOutcome::Identical(path) => path,
            CopyOutcome::Copied { dest, .. } => dest,
        }
    }

    /// Whether a new file was written
    pub fn changed(&self) -> bool {
        matches!(self, CopyOutcome::Copied { .. })
    }
}

/// Copy `source` to `dest`, creating directories and avoiding overwrites
pub fn copy_file(source: &Path, dest: &Path) -> Result<CopyOutcome> {
    if source == dest {
        return Ok(CopyOutcome::SamePath(dest.to_path_buf()));
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::copy(dest, e))?;
    }

    let (target, suffix) = match plan_destination(source, dest)? {
        CopyDecision::SkipIdentical(existing) => {
            debug!(?source, ?existing, "Identical file already present, skipping copy");
            return Ok(CopyOutcome::Identical(existing));
        }
        CopyDecision::CopyTo(path) => (path, None),
        CopyDecision::CopyToDisambiguated { path, suffix } => (path, Some(suffix)),
    };

    write_copy(source, &target)?;
    preserve_mtime(source, &target);

    Ok(CopyOutcome::Copied {
        dest: target,
        suffix,
    })
}

/// Probe `dest` and its suffixed variants to decide where `source` should go
///
/// Nothing is written.
pub fn plan_destination(source: &Path, dest: &Path) -> Result<CopyDecision> {
    let source_len = fs::metadata(source).map_err(|e| Error::copy(dest, e))?.len();
    let mut source_bytes: Option<Vec<u8>> = None;
    let mut candidate = dest.to_path_buf();
    let mut suffix = 0u32;

    while candidate.exists() {
        if same_contents(source, source_len, &mut source_bytes, &candidate)? {
            return Ok(CopyDecision::SkipIdentical(candidate));
        }
        suffix += 1;
        candidate = suffixed_path(dest, suffix);
        trace!(?candidate, "Destination taken by a different file, trying next name");
    }

    Ok(if suffix == 0 {
        CopyDecision::CopyTo(candidate)
    } else {
        CopyDecision::CopyToDisambiguated {
            path: candidate,
            suffix,
        }
    })
}

/// `dir/name.ext` becomes `dir/name_<suffix>.ext`
pub(crate) fn suffixed_path(path: &Path, suffix: u32) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    parent.join(format!("{stem}_{suffix}{extension}"))
}

/// Compare the source with an existing file, reading the source at most once
fn same_contents(
    source: &Path,
    source_len: u64,
    source_bytes: &mut Option<Vec<u8>>,
    existing: &Path,
) -> Result<bool> {
    let existing_len = fs::metadata(existing)
        .map_err(|e| Error::copy(existing, e))?
        .len();
    if existing_len != source_len {
        return Ok(false);
    }

    if source_bytes.is_none() {
        *source_bytes = Some(fs::read(source).map_err(|e| Error::copy(existing, e))?);
    }
    let existing_bytes = fs::read(existing).map_err(|e| Error::copy(existing, e))?;

    Ok(source_bytes.as_deref() == Some(existing_bytes.as_slice()))
}

/// Stream `source` into a new file at `dest` and sync it to disk
fn write_copy(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source).map_err(|e| Error::copy(dest, e))?;
    let dest_file = File::create(dest).map_err(|e| Error::copy(dest, e))?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    io::copy(&mut reader, &mut writer).map_err(|e| Error::copy(dest, e))?;
    writer.flush().map_err(|e| Error::copy(dest, e))?;

    let dest_file = writer
        .into_inner()
        .map_err(|e| Error::copy(dest, e.into_error()))?;
    dest_file.sync_all().map_err(|e| Error::copy(dest, e))?;
    Ok(())
}

/// Carry the source modification time over to the copy (best effort)
fn preserve_mtime(source: &Path, dest: &Path) {
    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
    {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_same_path_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "a.jpg", b"a");

        let outcome = copy_file(&src, &src).unwrap();
        assert_eq!(outcome, CopyOutcome::SamePath(src.clone()));
        assert!(!outcome.changed());
    }

    #[test]
    fn test_copies_and_creates_directories() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src/a.jpg", b"hello");
        let dest = dir.path().join("lib/2021/2021-03 March/img.jpg");

        let outcome = copy_file(&src, &dest).unwrap();
        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                dest: dest.clone(),
                suffix: None
            }
        );
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_keeps_source_mtime() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "a.jpg", b"hello");
        let mtime = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        let dest = dir.path().join("out/a.jpg");
        copy_file(&src, &dest).unwrap();

        let copied = filetime::FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(copied.unix_seconds(), 1_500_000_000);
    }

    #[test]
    fn test_second_copy_is_skipped() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "a.jpg", b"same bytes");
        let dest = dir.path().join("out/img.jpg");

        assert!(copy_file(&src, &dest).unwrap().changed());
        let again = copy_file(&src, &dest).unwrap();

        assert_eq!(again, CopyOutcome::Identical(dest.clone()));
        assert!(!dir.path().join("out/img_1.jpg").exists());
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }

    #[test]
    fn test_colliding_files_get_suffixes() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.jpg", b"one");
        let second = write(&dir, "second.jpg", b"two");
        let third = write(&dir, "third.jpg", b"three");
        let dest = dir.path().join("out/img.jpg");

        copy_file(&first, &dest).unwrap();
        let outcome = copy_file(&second, &dest).unwrap();
        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                dest: dir.path().join("out/img_1.jpg"),
                suffix: Some(1)
            }
        );
        let outcome = copy_file(&third, &dest).unwrap();
        assert_eq!(outcome.path(), dir.path().join("out/img_2.jpg"));

        assert_eq!(fs::read(&dest).unwrap(), b"one");
        assert_eq!(fs::read(dir.path().join("out/img_1.jpg")).unwrap(), b"two");
        assert_eq!(fs::read(dir.path().join("out/img_2.jpg")).unwrap(), b"three");
    }

    #[test]
    fn test_identical_file_at_suffixed_slot_is_found() {
        let dir = TempDir::new().unwrap();
        write(&dir, "out/img.jpg", b"other");
        write(&dir, "out/img_1.jpg", b"mine");
        let src = write(&dir, "src.jpg", b"mine");

        let outcome = copy_file(&src, &dir.path().join("out/img.jpg")).unwrap();
        assert_eq!(outcome, CopyOutcome::Identical(dir.path().join("out/img_1.jpg")));
    }

    #[test]
    fn test_same_size_different_contents() {
        let dir = TempDir::new().unwrap();
        write(&dir, "out/img.jpg", b"abcd");
        let src = write(&dir, "src.jpg", b"abce");

        let decision = plan_destination(&src, &dir.path().join("out/img.jpg")).unwrap();
        assert_eq!(
            decision,
            CopyDecision::CopyToDisambiguated {
                path: dir.path().join("out/img_1.jpg"),
                suffix: 1
            }
        );
    }

    #[test]
    fn test_plan_does_not_write() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.jpg", b"data");
        let dest = dir.path().join("img.jpg");

        assert_eq!(
            plan_destination(&src, &dest).unwrap(),
            CopyDecision::CopyTo(dest.clone())
        );
        assert!(!dest.exists());
    }

    #[test]
    fn test_name_without_extension() {
        let dir = TempDir::new().unwrap();
        write(&dir, "out/clip", b"old");
        let src = write(&dir, "src", b"new");

        let outcome = copy_file(&src, &dir.path().join("out/clip")).unwrap();
        assert_eq!(outcome.path(), dir.path().join("out/clip_1"));
    }

    #[test]
    fn test_failure_reports_attempted_path() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.jpg", b"data");
        // A plain file where a directory is needed
        write(&dir, "blocked", b"x");
        let dest = dir.path().join("blocked/2021/img.jpg");

        match copy_file(&src, &dest).unwrap_err() {
            Error::Copy { path, .. } => assert_eq!(path, dest),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out/img.jpg");

        let err = copy_file(&dir.path().join("nope.jpg"), &dest).unwrap_err();
        assert!(matches!(err, Error::Copy { ref path, .. } if *path == dest));
    }
}

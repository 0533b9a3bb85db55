//! Crash-safe replacement of small data files.
//!
//! Bytes go to a temp file in the destination directory and are renamed over
//! the target. Where rename cannot replace an existing file, the old file is
//! moved aside to `<name>.bak` first and restored if the swap fails.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// `fsync` the temp file before the rename.
    SyncFile,
    /// `fsync` the temp file and, best effort, the parent directory.
    SyncFileAndDir,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub sync: SyncPolicy,
    /// Restrict the file to its owner (0o600). Ignored off Unix.
    pub owner_only: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: SyncPolicy::SyncFile,
            owner_only: true,
        }
    }
}

/// Replace `path` with `bytes` using [`WriteOptions::default`].
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with(path, bytes, WriteOptions::default())
}

pub fn write_atomic_with(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: WriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    set_owner_only(tmp.path(), options.owner_only)?;
    tmp.write_all(bytes)?;
    if options.sync != SyncPolicy::Skip {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = backup_path(path);
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(retry) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(retry.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!(path = %backup.display(), error = %e, "Failed to remove backup after write");
        }
    }

    set_owner_only(path, options.owner_only)?;
    if options.sync == SyncPolicy::SyncFileAndDir {
        sync_dir_best_effort(parent);
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "File written atomically");
    Ok(())
}

/// Restore `path` from `path.bak` left behind by an interrupted write.
///
/// Returns whether a backup was restored.
pub fn recover_backup(path: &Path) -> bool {
    let backup = backup_path(path);
    if path.exists() || !backup.exists() {
        return false;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            tracing::warn!(path = %path.display(), "Recovered backup from interrupted write");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to recover backup");
            false
        }
    }
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    path.with_extension("bak")
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path, owner_only: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if owner_only {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path, _owner_only: bool) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir_best_effort(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(path = %dir.display(), error = %e, "Directory sync failed (best-effort)");
    }
}

#[cfg(not(unix))]
fn sync_dir_best_effort(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: WriteOptions = WriteOptions {
        sync: SyncPolicy::Skip,
        owner_only: false,
    };

    #[test]
    fn overwrites_existing_and_leaves_no_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");

        write_atomic_with(&path, b"[1]", FAST).expect("first write");
        write_atomic_with(&path, b"[1,2]", FAST).expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "[1,2]");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data").join("results.json");

        write_atomic(&path, b"[]").expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"[]");
    }

    #[test]
    fn recovers_orphaned_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        fs::write(path.with_extension("bak"), b"[\"old\"]").expect("seed backup");

        assert!(recover_backup(&path));
        assert_eq!(fs::read_to_string(&path).expect("read"), "[\"old\"]");
        assert!(!recover_backup(&path));
    }

    #[cfg(unix)]
    #[test]
    fn default_options_restrict_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        write_atomic(&path, b"[]").expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

//! All-or-nothing artifact persistence.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors from atomic artifact writes.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Destination path has no parent directory to stage the write in.
    #[error("Destination has no parent directory: {path}")]
    NoParent { path: PathBuf },

    /// Temporary file could not be created next to the destination.
    #[error("Failed to stage temporary file in {dir}: {source}")]
    Stage {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Buffer could not be written or flushed to the temporary file.
    #[error("Failed to write artifact for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rename onto the destination failed.
    #[error("Failed to commit artifact to {path}: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write `bytes` to `dest` so that the destination is never observable in
/// a partially written state.
///
/// The buffer is staged in a uniquely named temporary file in the same
/// directory as `dest` (same filesystem, so the commit is a pure rename),
/// flushed and synced, then renamed onto `dest`, replacing any existing
/// file in a single step. On any failure the temporary file is removed and
/// the destination keeps its prior content.
///
/// Concurrent writers to the same destination are not coordinated: the
/// last rename to complete wins.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let dir = match dest.parent() {
        // A bare filename has an empty parent; stage in the working directory.
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(WriteError::NoParent {
                path: dest.to_path_buf(),
            });
        }
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| WriteError::Stage {
        dir: dir.to_path_buf(),
        source,
    })?;

    // Failures from here on drop `tmp`, which removes the staged file.
    tmp.write_all(bytes).map_err(|source| WriteError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    tmp.flush().map_err(|source| WriteError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    tmp.as_file()
        .sync_all()
        .map_err(|source| WriteError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

    tmp.persist(dest).map_err(|err| WriteError::Commit {
        path: dest.to_path_buf(),
        source: err.error,
    })?;

    debug!(path = %dest.display(), bytes = bytes.len(), "committed artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_writes_new_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");

        write_atomic(&dest, b"hello").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");
        fs::write(&dest, "old content").unwrap();

        write_atomic(&dest, b"new").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_missing_parent_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing").join("out.bin");

        let err = write_atomic(&dest, b"data").unwrap_err();
        assert!(matches!(err, WriteError::Stage { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_failed_commit_keeps_destination_and_cleans_temp() {
        let temp = TempDir::new().unwrap();
        // A directory at the destination path makes the rename fail.
        let dest = temp.path().join("occupied");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("survivor.txt"), "old").unwrap();

        let err = write_atomic(&dest, b"data").unwrap_err();
        assert!(matches!(err, WriteError::Commit { .. }));

        // Destination untouched, and no temp files leaked next to it.
        assert_eq!(fs::read_to_string(dest.join("survivor.txt")).unwrap(), "old");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n != "occupied")
            .collect();
        assert!(leftovers.is_empty(), "leaked temp files: {leftovers:?}");
    }
}

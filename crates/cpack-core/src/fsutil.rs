//! Filesystem leaf layer
//!
//! Small helpers shared by the chart loader, the runtime writer and the
//! metadata store: directory resolution, optional reads, cancel-aware tree
//! walks and atomic file writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::{CoreError, Result};

/// Resolve a path to an absolute, existing directory.
pub fn resolve_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(CoreError::ChartNotFound {
            path: String::new(),
        });
    }

    let abs = std::path::absolute(path)?;
    let meta = fs::metadata(&abs).map_err(|_| CoreError::ChartNotFound {
        path: abs.display().to_string(),
    })?;
    if !meta.is_dir() {
        return Err(CoreError::InvalidChart {
            message: format!("path '{}' is not a directory", abs.display()),
        });
    }

    Ok(abs)
}

/// Read a file, returning `None` when it does not exist.
pub fn read_optional(path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
    match fs::read(path.as_ref()) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Walk a directory tree, invoking `visit` for each regular file with the
/// slash-separated path relative to `dir` and the file contents.
///
/// A missing directory is not an error; the walk simply yields nothing.
/// Cancellation is checked before each file read.
pub fn walk_files(
    dir: &Path,
    cancel: &CancellationToken,
    mut visit: impl FnMut(&str, Vec<u8>) -> Result<()>,
) -> Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(CoreError::InvalidChart {
                message: format!("path '{}' is not a directory", dir.display()),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| CoreError::InvalidChart {
                message: format!("walk produced path outside root: {}", e),
            })?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let data = fs::read(entry.path())?;
        visit(&rel, data)?;
    }

    Ok(())
}

/// Ensure a directory (and its parents) exists.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "directory path is empty",
        )));
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file atomically: temp sibling, flush to stable storage, rename.
///
/// The rename is the sole externally observable commit point; the temp file
/// is cleaned up on any early exit path (drop of `NamedTempFile`).
pub fn write_file_atomic(path: &Path, data: &[u8], cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    let dir = path.parent().ok_or_else(|| {
        CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path '{}' has no parent directory", path.display()),
        ))
    })?;
    ensure_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote file atomically");
    Ok(())
}

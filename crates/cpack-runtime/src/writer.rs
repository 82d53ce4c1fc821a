//! Runtime directory writer
//!
//! Materializes a rendered release into `<base>/<release>/`:
//! `docker-compose.yaml` plus a `files/` subtree. Every call replaces the
//! entire `files/` subtree, so nothing from a previous render survives
//! unless the new render produced it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tokio_util::sync::CancellationToken;

use cpack_core::fsutil;

use crate::error::{Result, RuntimeError};

/// Rendered compose document file name
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";
/// Subtree holding rendered and static files
pub const FILES_DIR_NAME: &str = "files";

/// Artifacts to write into a release runtime directory
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Release name (becomes the directory name under `base_dir`)
    pub release_name: String,

    /// Base releases directory
    pub base_dir: PathBuf,

    /// Rendered compose document
    pub compose_yaml: Vec<u8>,

    /// Files to place under `files/`, keyed by relative path
    pub files: BTreeMap<String, Vec<u8>>,
}

/// Commit rendered artifacts to `<base_dir>/<release_name>`.
///
/// Individual files are written atomically (temp, fsync, rename) in sorted
/// key order, but failure is not transactional across files: a path-safety
/// violation aborts remaining writes and leaves earlier ones in place.
pub fn write_runtime(opts: &WriteOptions, cancel: &CancellationToken) -> Result<PathBuf> {
    if opts.release_name.is_empty() {
        return Err(RuntimeError::InvalidOptions {
            message: "release name is required".to_string(),
        });
    }
    if opts.base_dir.as_os_str().is_empty() {
        return Err(RuntimeError::InvalidOptions {
            message: "base directory is required".to_string(),
        });
    }
    if opts.compose_yaml.is_empty() {
        return Err(RuntimeError::InvalidOptions {
            message: "compose YAML cannot be empty".to_string(),
        });
    }
    if cancel.is_cancelled() {
        return Err(RuntimeError::Cancelled);
    }

    let runtime_dir = opts.base_dir.join(&opts.release_name);
    fsutil::ensure_dir(&runtime_dir)?;

    fsutil::write_file_atomic(&runtime_dir.join(COMPOSE_FILE_NAME), &opts.compose_yaml, cancel)?;

    let files_root = runtime_dir.join(FILES_DIR_NAME);
    if files_root.exists() {
        fs::remove_dir_all(&files_root)?;
    }
    fsutil::ensure_dir(&files_root)?;

    // BTreeMap iteration is already key-sorted, which keeps write order
    // deterministic.
    for (rel, data) in &opts.files {
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        let clean = sanitize_rel_path(rel)?;
        fsutil::write_file_atomic(&files_root.join(clean), data, cancel)?;
    }

    tracing::debug!(
        runtime = %runtime_dir.display(),
        files = opts.files.len(),
        "materialized release runtime"
    );

    Ok(runtime_dir)
}

/// Validate a relative file path for containment under the files root.
///
/// Rejects absolute paths, empty or `.` paths, and any `..` component.
fn sanitize_rel_path(rel: &str) -> Result<PathBuf> {
    let path = Path::new(rel);
    let mut clean = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RuntimeError::InvalidPath {
                    path: rel.to_string(),
                });
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(RuntimeError::InvalidPath {
            path: rel.to_string(),
        });
    }

    Ok(clean)
}

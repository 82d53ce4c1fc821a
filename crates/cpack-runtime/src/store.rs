//! Release metadata store
//!
//! Persists the `release.json` provenance record inside a runtime
//! directory, via the same flush-then-rename protocol the writer uses.

use std::path::Path;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use cpack_core::release::{METADATA_FILE_NAME, ReleaseMetadata};
use cpack_core::fsutil;

use crate::error::{Result, RuntimeError};

/// Loads and saves release metadata records.
#[derive(Debug, Default)]
pub struct MetadataStore;

impl MetadataStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the metadata record from `<runtime>/release.json`.
    ///
    /// A missing file is not an error; it yields `Ok(None)`.
    pub fn load(
        &self,
        runtime_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<ReleaseMetadata>> {
        if runtime_path.as_os_str().is_empty() {
            return Err(RuntimeError::Metadata {
                message: "runtime path is required".to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        let path = runtime_path.join(METADATA_FILE_NAME);
        let data = match fsutil::read_optional(&path)? {
            Some(data) => data,
            None => return Ok(None),
        };

        let meta = serde_json::from_slice(&data).map_err(|e| RuntimeError::Metadata {
            message: format!("parse {}: {}", path.display(), e),
        })?;

        Ok(Some(meta))
    }

    /// Write the metadata record to `<runtime>/release.json`.
    ///
    /// Fills `runtime_path` and, when unset, `created_at`; the record is
    /// rewritten whole, never patched.
    pub fn save(
        &self,
        runtime_path: &Path,
        meta: &mut ReleaseMetadata,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if runtime_path.as_os_str().is_empty() {
            return Err(RuntimeError::Metadata {
                message: "runtime path is required".to_string(),
            });
        }
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        meta.runtime_path = runtime_path.display().to_string();
        if meta.created_at.is_none() {
            meta.created_at = Some(Utc::now());
        }

        fsutil::ensure_dir(runtime_path)?;

        let data = serde_json::to_vec_pretty(meta).map_err(|e| RuntimeError::Metadata {
            message: format!("serialize metadata: {}", e),
        })?;
        fsutil::write_file_atomic(&runtime_path.join(METADATA_FILE_NAME), &data, cancel)?;

        tracing::debug!(
            release = %meta.release_name,
            runtime = %runtime_path.display(),
            "saved release metadata"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpack_core::Values;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> ReleaseMetadata {
        ReleaseMetadata {
            release_name: "web".to_string(),
            chart_name: "demo".to_string(),
            chart_version: "0.1.0".to_string(),
            chart_digest: "sha256:abc".to_string(),
            runtime_path: String::new(),
            created_at: None,
            values: Values(json!({"app": {"image": "nginx"}})),
            values_sources: vec!["values.yaml".to_string()],
            compose_files: vec!["docker-compose.yaml".to_string()],
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new();
        let loaded = store.load(tmp.path(), &CancellationToken::new()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let runtime = tmp.path().join("web");
        let store = MetadataStore::new();

        let mut meta = sample();
        store
            .save(&runtime, &mut meta, &CancellationToken::new())
            .unwrap();

        // Save fills created_at and runtime_path.
        assert!(meta.created_at.is_some());
        assert_eq!(meta.runtime_path, runtime.display().to_string());

        let loaded = store
            .load(&runtime, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.release_name, meta.release_name);
        assert_eq!(loaded.chart_digest, meta.chart_digest);
        assert_eq!(loaded.created_at, meta.created_at);
        assert_eq!(loaded.values, meta.values);
        assert_eq!(loaded.values_sources, meta.values_sources);
        assert_eq!(loaded.compose_files, meta.compose_files);
    }

    #[test]
    fn test_save_preserves_existing_created_at() {
        let tmp = TempDir::new().unwrap();
        let runtime = tmp.path().join("web");
        let store = MetadataStore::new();

        let mut meta = sample();
        meta.created_at = Some("2020-01-01T00:00:00Z".parse().unwrap());
        store
            .save(&runtime, &mut meta, &CancellationToken::new())
            .unwrap();

        let loaded = store
            .load(&runtime, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(
            loaded.created_at,
            Some("2020-01-01T00:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn test_save_overwrites_whole_record() {
        let tmp = TempDir::new().unwrap();
        let runtime = tmp.path().join("web");
        let store = MetadataStore::new();

        let mut first = sample();
        store
            .save(&runtime, &mut first, &CancellationToken::new())
            .unwrap();

        let mut second = sample();
        second.values_sources = vec![];
        second.chart_version = "0.2.0".to_string();
        store
            .save(&runtime, &mut second, &CancellationToken::new())
            .unwrap();

        let loaded = store
            .load(&runtime, &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.chart_version, "0.2.0");
        assert!(loaded.values_sources.is_empty());
    }

    #[test]
    fn test_load_unparsable_fails() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(METADATA_FILE_NAME), b"{not json").unwrap();

        let store = MetadataStore::new();
        let err = store
            .load(tmp.path(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Metadata { .. }));
    }

    #[test]
    fn test_serialized_form_is_indented() {
        let tmp = TempDir::new().unwrap();
        let runtime = tmp.path().join("web");
        let store = MetadataStore::new();
        store
            .save(&runtime, &mut sample(), &CancellationToken::new())
            .unwrap();

        let text = fs::read_to_string(runtime.join(METADATA_FILE_NAME)).unwrap();
        assert!(text.contains("\n  \"releaseName\""));
    }
}

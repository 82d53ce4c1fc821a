//! Release metadata record
//!
//! The `release.json` record persisted next to each runtime directory.
//! The record is always rewritten whole on save, never patched; unknown or
//! absent fields default on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::values::Values;

/// File name of the metadata record inside a runtime directory
pub const METADATA_FILE_NAME: &str = "release.json";

/// Provenance record for an installed release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseMetadata {
    /// Release name
    pub release_name: String,

    /// Chart name at install time
    pub chart_name: String,

    /// Chart version at install time
    pub chart_version: String,

    /// Content-derived chart digest
    pub chart_digest: String,

    /// Absolute runtime directory path
    pub runtime_path: String,

    /// Creation timestamp (UTC); set once by the store, never rewritten
    pub created_at: Option<DateTime<Utc>>,

    /// Merged values snapshot
    pub values: Values,

    /// Ordered value-file sources that contributed to the merge
    pub values_sources: Vec<String>,

    /// Compose files produced by the render
    pub compose_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serde_field_names() {
        let meta = ReleaseMetadata {
            release_name: "web".to_string(),
            chart_name: "demo".to_string(),
            chart_version: "0.1.0".to_string(),
            chart_digest: "sha256:abc".to_string(),
            runtime_path: "/tmp/r/web".to_string(),
            created_at: Some("2026-01-02T03:04:05Z".parse().unwrap()),
            values: Values(json!({"a": 1})),
            values_sources: vec!["values.yaml".to_string()],
            compose_files: vec!["docker-compose.yaml".to_string()],
        };

        let doc: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();

        assert_eq!(doc["releaseName"], "web");
        assert_eq!(doc["chartName"], "demo");
        assert_eq!(doc["chartVersion"], "0.1.0");
        assert_eq!(doc["chartDigest"], "sha256:abc");
        assert_eq!(doc["runtimePath"], "/tmp/r/web");
        assert_eq!(doc["createdAt"], "2026-01-02T03:04:05Z");
        assert_eq!(doc["values"]["a"], 1);
        assert_eq!(doc["valuesSources"][0], "values.yaml");
        assert_eq!(doc["composeFiles"][0], "docker-compose.yaml");
    }

    #[test]
    fn test_absent_fields_default_on_read() {
        let meta: ReleaseMetadata =
            serde_json::from_str(r#"{"releaseName": "web"}"#).unwrap();
        assert_eq!(meta.release_name, "web");
        assert!(meta.chart_name.is_empty());
        assert!(meta.created_at.is_none());
        assert!(meta.compose_files.is_empty());
    }
}

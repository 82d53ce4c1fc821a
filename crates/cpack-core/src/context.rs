//! Template rendering context

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chart::ChartMetadata;
use crate::values::Values;

/// Release identity surfaced via `Release` in templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Release name
    pub name: String,

    /// Logical service name (always "cpack")
    pub service: String,
}

impl ReleaseInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            service: "cpack".to_string(),
        }
    }
}

/// Read-only accessor over chart static files, surfaced via `Files`.
#[derive(Debug, Clone, Default)]
pub struct StaticFiles {
    files: Arc<BTreeMap<String, Vec<u8>>>,
}

impl StaticFiles {
    pub fn new(files: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            files: Arc::new(files),
        }
    }

    /// File contents as text; empty string when absent or not UTF-8.
    pub fn get(&self, name: &str) -> String {
        self.files
            .get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
            .unwrap_or_default()
    }

    /// A copy of the file bytes, if present.
    pub fn get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.files.get(name).cloned()
    }

    /// Whether the file exists.
    pub fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

/// Data exposed to templates at render time.
///
/// Constructed fresh per render call; not persisted.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Merged values
    pub values: Values,

    /// Effective environment overrides (checked before the real process
    /// environment by the `env` template function)
    pub env: BTreeMap<String, String>,

    /// Release identity
    pub release: ReleaseInfo,

    /// Chart metadata
    pub chart: ChartMetadata,

    /// Static file accessor
    pub files: StaticFiles,
}

impl RenderContext {
    pub fn new(
        values: Values,
        env: BTreeMap<String, String>,
        release: ReleaseInfo,
        chart: ChartMetadata,
        files: StaticFiles,
    ) -> Self {
        Self {
            values,
            env,
            release,
            chart,
            files,
        }
    }
}

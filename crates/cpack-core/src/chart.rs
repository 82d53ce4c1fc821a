//! Chart definition and loading
//!
//! A chart source directory looks like:
//!
//! ```text
//! <chart>/
//!   Chart.yaml              # name, version, description (name+version required)
//!   values.yaml             # optional default values
//!   values.schema.json      # optional JSON Schema over values
//!   templates/compose/**    # compose fragment templates
//!   templates/files/**.tpl  # file templates; ".tpl" stripped in output name
//!   templates/helpers/**    # named helpers, included only via `include`
//!   files/**                # static files copied verbatim into output
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, Result};
use crate::fsutil;
use crate::values::Values;

/// Chart metadata file name
pub const METADATA_FILE: &str = "Chart.yaml";
/// Default values file name
pub const VALUES_FILE: &str = "values.yaml";
/// Optional JSON Schema file name
pub const VALUES_SCHEMA_FILE: &str = "values.schema.json";
/// Compose templates subtree
pub const TEMPLATES_COMPOSE: &str = "templates/compose";
/// File templates subtree
pub const TEMPLATES_FILES: &str = "templates/files";
/// Helper templates subtree
pub const TEMPLATES_HELPERS: &str = "templates/helpers";
/// Static files subtree
pub const FILES_DIR: &str = "files";
/// Suffix that distinguishes file templates from static files
pub const TEMPLATE_FILE_SUFFIX: &str = ".tpl";

/// Chart metadata from Chart.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartMetadata {
    /// Chart name (required)
    #[serde(default)]
    pub name: String,

    /// Chart version (required)
    #[serde(default)]
    pub version: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

/// A loaded chart: metadata, values, schema, templates and static files.
///
/// Immutable once loaded; constructed per `load` call and discarded after
/// a render completes. All map keys are chart-relative slash-separated
/// paths, unique within each map.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Absolute chart root directory
    pub base_dir: PathBuf,

    /// Chart metadata
    pub metadata: ChartMetadata,

    /// Default values (empty mapping when values.yaml is absent)
    pub values: Values,

    /// Raw schema bytes, stored verbatim; `None` means no validation
    pub values_schema: Option<Vec<u8>>,

    /// Compose fragment templates by relative name
    pub compose_templates: BTreeMap<String, String>,

    /// File templates keyed by their suffix-stripped output name
    pub file_templates: BTreeMap<String, String>,

    /// Helper templates, never rendered standalone
    pub helper_templates: BTreeMap<String, String>,

    /// Static files copied verbatim into rendered output
    pub static_files: BTreeMap<String, Vec<u8>>,
}

impl Chart {
    /// Load a chart from a directory.
    pub fn load(source: impl AsRef<Path>, cancel: &CancellationToken) -> Result<Self> {
        let base_dir = fsutil::resolve_dir(source)?;

        let metadata = load_metadata(&base_dir)?;
        let values = load_values(&base_dir)?;
        let values_schema = fsutil::read_optional(base_dir.join(VALUES_SCHEMA_FILE))?;

        let mut compose_templates = BTreeMap::new();
        fsutil::walk_files(&base_dir.join(TEMPLATES_COMPOSE), cancel, |rel, data| {
            compose_templates.insert(rel.to_string(), into_template_text(rel, data)?);
            Ok(())
        })?;

        let mut file_templates = BTreeMap::new();
        fsutil::walk_files(&base_dir.join(TEMPLATES_FILES), cancel, |rel, data| {
            let Some(output_name) = rel.strip_suffix(TEMPLATE_FILE_SUFFIX) else {
                return Err(CoreError::InvalidChart {
                    message: format!(
                        "file template '{}' must end with {}",
                        rel, TEMPLATE_FILE_SUFFIX
                    ),
                });
            };
            file_templates.insert(output_name.to_string(), into_template_text(rel, data)?);
            Ok(())
        })?;

        let mut helper_templates = BTreeMap::new();
        fsutil::walk_files(&base_dir.join(TEMPLATES_HELPERS), cancel, |rel, data| {
            helper_templates.insert(rel.to_string(), into_template_text(rel, data)?);
            Ok(())
        })?;

        let mut static_files = BTreeMap::new();
        fsutil::walk_files(&base_dir.join(FILES_DIR), cancel, |rel, data| {
            static_files.insert(rel.to_string(), data);
            Ok(())
        })?;

        Ok(Self {
            base_dir,
            metadata,
            values,
            values_schema,
            compose_templates,
            file_templates,
            helper_templates,
            static_files,
        })
    }

    /// Content-derived chart digest, recorded in release metadata.
    ///
    /// Covers metadata, default values, every template and every static
    /// file, in sorted name order, so the digest is stable across loads.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.metadata.name.as_bytes());
        hasher.update([0]);
        hasher.update(self.metadata.version.as_bytes());
        hasher.update([0]);
        hasher.update(self.values.inner().to_string().as_bytes());

        for (name, body) in &self.compose_templates {
            hasher.update(name.as_bytes());
            hasher.update(body.as_bytes());
        }
        for (name, body) in &self.file_templates {
            hasher.update(name.as_bytes());
            hasher.update(body.as_bytes());
        }
        for (name, body) in &self.helper_templates {
            hasher.update(name.as_bytes());
            hasher.update(body.as_bytes());
        }
        for (name, data) in &self.static_files {
            hasher.update(name.as_bytes());
            hasher.update(data);
        }

        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

fn into_template_text(rel: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|_| CoreError::InvalidChart {
        message: format!("template '{}' is not valid UTF-8", rel),
    })
}

fn load_metadata(base_dir: &Path) -> Result<ChartMetadata> {
    let data = fsutil::read_optional(base_dir.join(METADATA_FILE))?.ok_or_else(|| {
        CoreError::InvalidChart {
            message: format!("{} not found in {}", METADATA_FILE, base_dir.display()),
        }
    })?;

    let metadata: ChartMetadata = serde_yaml::from_slice(&data)?;
    if metadata.name.is_empty() || metadata.version.is_empty() {
        return Err(CoreError::InvalidChart {
            message: "chart metadata must include name and version".to_string(),
        });
    }

    Ok(metadata)
}

fn load_values(base_dir: &Path) -> Result<Values> {
    match fsutil::read_optional(base_dir.join(VALUES_FILE))? {
        Some(data) if !data.is_empty() => {
            let text = String::from_utf8(data).map_err(|_| CoreError::InvalidChart {
                message: format!("{} is not valid UTF-8", VALUES_FILE),
            })?;
            let values = Values::from_yaml(&text)?;
            if values.inner().is_null() {
                return Ok(Values::new());
            }
            Ok(values)
        }
        _ => Ok(Values::new()),
    }
}

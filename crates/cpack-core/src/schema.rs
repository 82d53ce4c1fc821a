//! Schema validation for merged values
//!
//! Charts may ship a `values.schema.json` (standard JSON Schema). When
//! present, the merged value tree is validated against it before rendering.

use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::values::Values;

/// Validate merged values against optional raw JSON Schema bytes.
///
/// Absent or empty schema bytes are a no-op. On failure the error message
/// is every violation as `"<path>: <reason>"` joined with `"; "`, in
/// validator-reported order. Callers match on that format.
pub fn validate_values(schema: Option<&[u8]>, values: &Values) -> Result<()> {
    let schema = match schema {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Ok(()),
    };

    let schema_doc: JsonValue =
        serde_json::from_slice(schema).map_err(|e| CoreError::InvalidSchema {
            message: format!("failed to parse values schema: {}", e),
        })?;

    let validator =
        jsonschema::validator_for(&schema_doc).map_err(|e| CoreError::InvalidSchema {
            message: format!("invalid values schema: {}", e),
        })?;

    let empty = JsonValue::Object(serde_json::Map::new());
    let instance = if values.inner().is_null() {
        &empty
    } else {
        values.inner()
    };

    if validator.is_valid(instance) {
        return Ok(());
    }

    let message = validator
        .iter_errors(instance)
        .map(|e| {
            let path = e.instance_path.to_string();
            let path = if path.is_empty() { "(root)".to_string() } else { path };
            format!("{}: {}", path, e)
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(CoreError::Validation { message })
}

//! Install command - materialize a chart into a named release runtime

use std::path::{Path, PathBuf};

use console::style;
use miette::{IntoDiagnostic, Result};
use tokio_util::sync::CancellationToken;

use cpack_core::ReleaseMetadata;
use cpack_runtime::{COMPOSE_FILE_NAME, MetadataStore, WriteOptions, write_runtime};

use super::render_release;

/// Run the install command
pub fn run(
    name: &str,
    chart_path: &Path,
    values_files: &[PathBuf],
    set_values: &[String],
    env_overrides: &[String],
    release_dir: &Path,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let rendered = render_release(name, chart_path, values_files, set_values, env_overrides, &cancel)?;

    println!(
        "{} Installing chart {} version {}",
        style("→").blue().bold(),
        style(&rendered.chart.metadata.name).cyan(),
        style(&rendered.chart.metadata.version).yellow()
    );

    // A reinstall keeps the original creation timestamp.
    let store = MetadataStore::new();
    let existing = store
        .load(&release_dir.join(name), &cancel)
        .into_diagnostic()?;

    let opts = WriteOptions {
        release_name: name.to_string(),
        base_dir: release_dir.to_path_buf(),
        compose_yaml: rendered.compose_yaml,
        files: rendered.files,
    };
    let runtime = write_runtime(&opts, &cancel).into_diagnostic()?;

    let mut metadata = ReleaseMetadata {
        release_name: name.to_string(),
        chart_name: rendered.chart.metadata.name.clone(),
        chart_version: rendered.chart.metadata.version.clone(),
        chart_digest: rendered.chart.digest(),
        runtime_path: String::new(),
        created_at: existing.and_then(|m| m.created_at),
        values: rendered.values,
        values_sources: rendered.values_sources,
        compose_files: vec![COMPOSE_FILE_NAME.to_string()],
    };
    store
        .save(&runtime, &mut metadata, &cancel)
        .into_diagnostic()?;

    println!(
        "{} Release {} installed at {}",
        style("✓").green().bold(),
        style(name).cyan(),
        style(runtime.display()).yellow()
    );

    Ok(())
}

//! Command implementations
//!
//! The shared pipeline lives here: load chart, merge values, validate,
//! render. Commands compose the core stages directly; install additionally
//! writes the runtime and records metadata.

pub mod init;
pub mod install;
pub mod template;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, miette};
use tokio_util::sync::CancellationToken;

use cpack_core::{
    Chart, ReleaseInfo, RenderContext, StaticFiles, Values, merge_layers, parse_set_values,
    validate_values,
};
use cpack_engine::Engine;

/// Everything a render run produces, before any disk materialization.
pub struct RenderedRelease {
    pub chart: Chart,
    pub values: Values,
    pub values_sources: Vec<String>,
    pub compose_yaml: Vec<u8>,
    pub files: BTreeMap<String, Vec<u8>>,
}

/// Run the rendering pipeline: load → merge → validate → render.
pub fn render_release(
    release_name: &str,
    chart_source: &Path,
    value_files: &[PathBuf],
    set_values: &[String],
    env_overrides: &[String],
    cancel: &CancellationToken,
) -> Result<RenderedRelease> {
    let chart = Chart::load(chart_source, cancel).into_diagnostic()?;

    let mut overlays = Vec::new();
    let mut values_sources = Vec::new();
    for file in value_files {
        overlays.push(Values::from_file(file).into_diagnostic()?);
        values_sources.push(file.display().to_string());
    }
    if !set_values.is_empty() {
        overlays.push(parse_set_values(set_values).into_diagnostic()?);
    }

    let merged = merge_layers(Some(&chart.values), &overlays);
    validate_values(chart.values_schema.as_deref(), &merged).into_diagnostic()?;

    let context = RenderContext::new(
        merged.clone(),
        parse_env_overrides(env_overrides)?,
        ReleaseInfo::new(release_name),
        chart.metadata.clone(),
        StaticFiles::new(chart.static_files.clone()),
    );

    let engine = Engine::new();
    let fragments = engine.render_compose(&chart, &context, cancel).into_diagnostic()?;
    let files = engine.render_files(&chart, &context, cancel).into_diagnostic()?;

    Ok(RenderedRelease {
        compose_yaml: join_fragments(&fragments),
        chart,
        values: merged,
        values_sources,
        files,
    })
}

/// Concatenate rendered compose fragments, sorted by name, into the one
/// compose document the runtime carries.
fn join_fragments(fragments: &BTreeMap<String, Vec<u8>>) -> Vec<u8> {
    let mut doc = Vec::new();
    for (idx, data) in fragments.values().enumerate() {
        if idx > 0 {
            doc.push(b'\n');
        }
        doc.extend_from_slice(data);
        if !data.ends_with(b"\n") {
            doc.push(b'\n');
        }
    }
    doc
}

fn parse_env_overrides(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| miette!("invalid --env value '{}'; must be KEY=VALUE", pair))?;
        map.insert(key.trim().to_string(), value.to_string());
    }
    Ok(map)
}

//! Template command - render a release without materializing it

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use console::style;
use miette::{IntoDiagnostic, Result};
use tokio_util::sync::CancellationToken;

use cpack_runtime::{WriteOptions, write_runtime};

use super::render_release;

/// Run the template command
pub fn run(
    name: &str,
    chart_path: &Path,
    values_files: &[PathBuf],
    set_values: &[String],
    env_overrides: &[String],
    output_dir: Option<&Path>,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let rendered = render_release(name, chart_path, values_files, set_values, env_overrides, &cancel)?;

    match output_dir {
        Some(base_dir) => {
            let opts = WriteOptions {
                release_name: name.to_string(),
                base_dir: base_dir.to_path_buf(),
                compose_yaml: rendered.compose_yaml,
                files: rendered.files,
            };
            let runtime = write_runtime(&opts, &cancel).into_diagnostic()?;
            println!(
                "{} Rendered {} to {}",
                style("✓").green().bold(),
                style(&rendered.chart.metadata.name).cyan(),
                style(runtime.display()).yellow()
            );
        }
        None => {
            print!("{}", String::from_utf8_lossy(&rendered.compose_yaml));
            print_file_listing(&rendered.files);
        }
    }

    Ok(())
}

fn print_file_listing(files: &BTreeMap<String, Vec<u8>>) {
    if files.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{} rendered files:", style("→").blue().bold());
    for name in files.keys() {
        eprintln!("  files/{}", name);
    }
}

//! Init command - scaffold a starter chart

use std::fs;
use std::path::Path;

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};

/// Run the init command
pub fn run(path: &Path, name: Option<&str>, version: &str, force: bool) -> Result<()> {
    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| miette::miette!(
                "cannot derive a chart name from '{}'; pass --name",
                path.display()
            ))?,
    };

    ensure_target_ready(path, force)?;

    for dir in [
        "templates/compose",
        "templates/files",
        "templates/helpers",
        "files",
    ] {
        fs::create_dir_all(path.join(dir))
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create {}", dir))?;
    }

    let chart_yaml = format!(
        r#"name: {name}
version: {version}
description: Starter compose chart
"#
    );
    fs::write(path.join("Chart.yaml"), chart_yaml)
        .into_diagnostic()
        .wrap_err("Failed to write Chart.yaml")?;

    let values_yaml = r#"app:
  image: my-app
  tag: latest
  env:
    EXAMPLE: "true"
"#;
    fs::write(path.join("values.yaml"), values_yaml)
        .into_diagnostic()
        .wrap_err("Failed to write values.yaml")?;

    let compose = r#"services:
  {{ Release.name }}-app:
    image: "{{ Values.app.image }}:{{ Values.app.tag }}"
    env_file:
      - ./files/config.yml
"#;
    fs::write(path.join("templates/compose/00-app.yaml"), compose)
        .into_diagnostic()
        .wrap_err("Failed to write templates/compose/00-app.yaml")?;

    let config = r#"example:
  env: {{ Values.app.env.EXAMPLE | default("true") }}
"#;
    fs::write(path.join("templates/files/config.yml.tpl"), config)
        .into_diagnostic()
        .wrap_err("Failed to write templates/files/config.yml.tpl")?;

    // Example helper, reachable as include("_fullname.tpl", dict("name", ...)).
    let helper = "{{ name }}-app";
    fs::write(path.join("templates/helpers/_fullname.tpl"), helper)
        .into_diagnostic()
        .wrap_err("Failed to write templates/helpers/_fullname.tpl")?;

    fs::write(path.join("files/.gitkeep"), "")
        .into_diagnostic()
        .wrap_err("Failed to write files/.gitkeep")?;

    println!(
        "{} Created chart {} at {}",
        style("✓").green().bold(),
        style(&name).cyan(),
        style(path.display()).yellow()
    );
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to customize your chart",
        style("values.yaml").cyan()
    );
    println!(
        "  2. Test with: {} template myrelease --chart {}",
        style("cpack").green(),
        path.display()
    );

    Ok(())
}

/// The target must be absent, or an existing directory that is empty
/// unless `--force` was given.
fn ensure_target_ready(path: &Path, force: bool) -> Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path)
                .into_diagnostic()
                .wrap_err("Failed to create chart directory")?;
            return Ok(());
        }
        Err(e) => return Err(e).into_diagnostic(),
    };

    if !meta.is_dir() {
        return Err(miette::miette!(
            "{} exists and is not a directory",
            path.display()
        ));
    }

    let occupied = fs::read_dir(path)
        .into_diagnostic()?
        .next()
        .is_some();
    if occupied && !force {
        return Err(miette::miette!(
            "directory {} is not empty (use --force to overwrite)",
            path.display()
        ));
    }

    Ok(())
}

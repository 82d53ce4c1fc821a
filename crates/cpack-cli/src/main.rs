//! cpack CLI - chart-based release renderer for docker-compose runtimes

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "cpack")]
#[command(author = "cpack Contributors")]
#[command(version)]
#[command(about = "Render compose charts into release runtime directories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Releases base directory
    #[arg(long, global = true, default_value = ".cpack-releases")]
    release_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a starter chart at the given path
    #[command(disable_version_flag = true)]
    Init {
        /// Target directory for the new chart
        path: PathBuf,

        /// Chart name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Chart version
        #[arg(long, default_value = "0.1.0")]
        version: String,

        /// Scaffold into a non-empty directory
        #[arg(long)]
        force: bool,
    },

    /// Render a release without materializing it
    Template {
        /// Release name (for template context)
        name: String,

        /// Chart directory to render
        #[arg(long)]
        chart: PathBuf,

        /// Values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Environment overrides visible to the env() template function
        #[arg(long = "env")]
        env: Vec<String>,

        /// Write the rendered runtime here instead of printing to stdout
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Install a chart into a named release runtime
    Install {
        /// Chart directory to install
        chart: PathBuf,

        /// Release name
        #[arg(long)]
        name: String,

        /// Values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Environment overrides visible to the env() template function
        #[arg(long = "env")]
        env: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            path,
            name,
            version,
            force,
        } => commands::init::run(&path, name.as_deref(), &version, force),
        Commands::Template {
            name,
            chart,
            values,
            set,
            env,
            output_dir,
        } => commands::template::run(&name, &chart, &values, &set, &env, output_dir.as_deref()),
        Commands::Install {
            chart,
            name,
            values,
            set,
            env,
        } => commands::install::run(&name, &chart, &values, &set, &env, &cli.release_dir),
    }
}

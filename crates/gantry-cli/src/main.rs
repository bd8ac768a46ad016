//! Gantry - Release artifact build & publish orchestrator
//!
//! The `gantry` command turns a "release published" event into uploaded
//! per-platform artifacts: one job per configured target, each building
//! a binary, packaging it with the docs file into a deterministically
//! named tar.gz, and uploading the archive as a release asset.
//!
//! ## Commands
//!
//! - `run`: execute the pipeline for a release event payload
//! - `targets`: list the configured platform matrix

mod config;
mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use crate::config::Manifest;
use gantry_pipeline::{Pipeline, PipelineConfig, RunGate};
use gantry_release::{Release, ReleaseClient};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, package, and publish per-platform release artifacts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted output and log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for a release event
    Run {
        /// Path to the release event payload (JSON), or `-` for stdin
        #[arg(short, long)]
        event: PathBuf,

        /// Path to the matrix manifest (JSON); builtin matrix if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Checkout root the toolchain runs in
        #[arg(long, default_value = ".")]
        workspace: PathBuf,

        /// Directory where staging directories and archives are written
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,

        /// Build and package but skip publishing
        #[arg(long)]
        dry_run: bool,

        /// Report partial success instead of failing when some targets fail
        #[arg(long)]
        fail_open: bool,
    },

    /// List the configured platform target matrix
    Targets {
        /// Path to the matrix manifest (JSON); builtin matrix if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            event,
            config,
            workspace,
            out_dir,
            dry_run,
            fail_open,
        } => {
            cmd_run(
                &event,
                config.as_deref(),
                workspace,
                out_dir,
                dry_run,
                fail_open,
                cli.json,
            )
            .await
        }
        Commands::Targets { config } => cmd_targets(config.as_deref(), cli.json),
    }
}

async fn cmd_run(
    event: &Path,
    manifest_path: Option<&Path>,
    workspace: PathBuf,
    out_dir: PathBuf,
    dry_run: bool,
    fail_open: bool,
    json: bool,
) -> Result<()> {
    let manifest = Manifest::load_or_default(manifest_path)?;
    let release = load_release(event)?;

    info!(
        release_id = release.id,
        tag = %release.tag,
        product = %manifest.product,
        "Release event received"
    );

    let pipeline_config = PipelineConfig {
        product: manifest.product.clone(),
        bin_name: manifest.bin_name.clone(),
        readme: manifest.readme.clone(),
        workspace_dir: workspace,
        out_dir,
        fail_open,
        dry_run,
    };

    let host = Arc::new(ReleaseClient::from_env());
    let result = Pipeline::run(host, &pipeline_config, &release, manifest.targets)
        .await
        .context("Pipeline configuration rejected")?;
    let verdict = RunGate::evaluate(&result);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for job in &result.jobs {
            println!("{}", job.summary());
        }
        println!("{}", verdict.message);
    }

    if !result.success {
        bail!("{}", verdict.message);
    }
    Ok(())
}

fn load_release(event: &Path) -> Result<Release> {
    let payload = if event == Path::new("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .context("Failed to read event payload from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(event)
            .with_context(|| format!("Failed to read event payload {:?}", event))?
    };
    serde_json::from_str(&payload)
        .with_context(|| format!("Failed to parse release event payload {:?}", event))
}

fn cmd_targets(manifest_path: Option<&Path>, json: bool) -> Result<()> {
    let manifest = Manifest::load_or_default(manifest_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest.targets)?);
        return Ok(());
    }

    for target in &manifest.targets {
        let status = if target.enabled { "" } else { " (disabled)" };
        println!("{:<12} {}{}", target.label, target.triple, status);
    }
    Ok(())
}

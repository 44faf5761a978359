use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bibliomine_core::{pipeline, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "bibliomine",
    about = "Bibliometric ingestion pipeline: dedup Scopus and Web of Science exports",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the YAML parameters file.
    #[arg(long, default_value = "config/pipeline.yml")]
    config: PathBuf,

    /// Override the configured Scopus export path.
    #[arg(long)]
    scopus: Option<PathBuf>,

    /// Override the configured WoS export path.
    #[arg(long)]
    wos: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    if let Some(scopus) = cli.scopus {
        config.paths.raw_data.scopus = scopus;
    }
    if let Some(wos) = cli.wos {
        config.paths.raw_data.wos = wos;
    }

    let started = Instant::now();
    let outcome = pipeline::run(&config).context("pipeline failed")?;

    tracing::info!(
        canonical_records = outcome.canonical_records,
        collisions = outcome.collisions,
        removed = outcome.summary.deduplication.total_removed,
        elapsed_ms = started.elapsed().as_millis(),
        "pipeline completed"
    );

    Ok(())
}

//! MovieMetrics CLI entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use moviemetrics::config::{api_key_from_env, Settings};
use moviemetrics::pipeline;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "moviemetrics",
    version,
    about = "TMDB movie analytics pipeline",
    long_about = "Fetches movie metadata from TMDB, cleans it into a flat \
                  dataset, and writes KPI reports.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  TMDB_API_KEY    API key for TMDB (required for fetching)"
)]
struct Cli {
    /// Path to the YAML settings file
    #[arg(short, long, default_value = "config/settings.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full fetch -> clean -> report pipeline
    Run,
    /// Fetch raw movies and write the audit file only
    Fetch,
    /// Clean a previously fetched raw audit file
    Clean {
        /// Raw audit JSON file from a fetch run
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Recompute KPI reports from a cleaned dataset
    Report {
        /// Cleaned dataset JSON (movies_cleaned.json)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moviemetrics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = if cli.config.exists() {
        Settings::load(&cli.config)?
    } else {
        info!(config = %cli.config.display(), "No settings file, using defaults");
        Settings::default()
    };

    match cli.command {
        Command::Run => {
            let api_key = api_key_from_env()?;
            let summary = pipeline::run_pipeline(&settings, api_key).await?;
            info!(
                fetched = summary.fetched,
                cleaned = summary.cleaned,
                duplicates_replaced = summary.duplicates_replaced,
                dropped = summary.drops.total(),
                audit = %summary.audit_file.display(),
                "Pipeline finished"
            );
            for path in &summary.outputs {
                info!(output = %path.display(), "Report written");
            }
        }
        Command::Fetch => {
            let api_key = api_key_from_env()?;
            let audit_file = pipeline::run_fetch(&settings, api_key).await?;
            info!(audit = %audit_file.display(), "Fetch finished");
        }
        Command::Clean { input } => {
            let report = pipeline::run_clean(&settings, &input)?;
            info!(
                cleaned = report.rows.len(),
                duplicates_replaced = report.duplicates_replaced,
                dropped = report.drops.total(),
                "Clean finished"
            );
        }
        Command::Report { input } => {
            let outputs = pipeline::run_report(&settings, &input)?;
            info!(reports = outputs.len(), "Report finished");
        }
    }

    Ok(())
}

//! Surprise CLI binary.
//!
//! Runs the pipeline stages: ingest historical prices, merge lagged returns
//! onto the event tables, train and report the classifier, and rank
//! features on the full dataset.

mod cmd;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use surprise_core::PipelineConfig;
use tracing::Level;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "SURPRISE_CONFIG";

#[derive(Parser)]
#[command(name = "surprise")]
#[command(about = "Economic-event surprise pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults to $SURPRISE_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse historical price files into lagged returns
    Ingest {
        /// Directory scanned for price files
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },

    /// Left-join lagged returns onto the event tables
    Merge,

    /// Train the classifier and write the report and charts
    Train {
        /// Merged table to train on
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Rank numeric features by split count on the full dataset
    Importance {
        /// Merged table to train on
        #[arg(long)]
        data: Option<PathBuf>,

        /// Bars in the chart
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Run every stage in order
    Run,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    let path = path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let config = match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let mut config = load_config(cli.config)?;

    match cli.command {
        Commands::Ingest { source_dir } => {
            if source_dir.is_some() {
                config.ingest.source_dir = source_dir;
            }
            cmd::ingest::run_ingest(&config.ingest)?;
        }
        Commands::Merge => {
            cmd::merge::run_merge(&config.merge)?;
        }
        Commands::Train { data } => {
            if let Some(data) = data {
                config.model.data_path = data;
            }
            cmd::train::run_train(&config.model)?;
        }
        Commands::Importance { data, top_n } => {
            if let Some(data) = data {
                config.importance.data_path = data;
            }
            if let Some(top_n) = top_n {
                config.importance.top_n = top_n;
            }
            cmd::importance::run_importance(&config.importance)?;
        }
        Commands::Run => {
            cmd::ingest::run_ingest(&config.ingest)?;
            cmd::merge::run_merge(&config.merge)?;
            cmd::train::run_train(&config.model)?;
            cmd::importance::run_importance(&config.importance)?;
        }
    }

    Ok(())
}

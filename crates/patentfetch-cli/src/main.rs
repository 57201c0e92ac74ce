//! patentfetch: download patent PDFs from Google Patents for a list of
//! identifiers.

mod check;
mod progress;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use patentfetch_config::Config;
use patentfetch_retrieval::input::read_identifiers;
use patentfetch_retrieval::{BatchSummary, CancelFlag, RetrievalPipeline};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::progress::ProgressObserver;

#[derive(Parser)]
#[command(name = "patentfetch")]
#[command(version)]
#[command(about = "Download patent PDFs from Google Patents", long_about = None)]
struct Cli {
    /// Config file (defaults to $PATENTFETCH_CONFIG, then ./patentfetch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every patent listed in an input file
    Download {
        /// CSV/TSV export, or a text file with one identifier per line
        #[arg(short, long)]
        input: PathBuf,

        /// Column holding the identifiers
        #[arg(long)]
        column: Option<String>,

        /// Directory the PDFs are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append-only log of failed identifiers
        #[arg(long)]
        failure_log: Option<PathBuf>,

        /// Delay between identifiers, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Verify configuration, output directory and network access
    Check {
        /// Also verify this input file has the configured column
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "patentfetch=debug,info" } else { "patentfetch=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Download { input, column, output, failure_log, delay_ms } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(column) = column {
                config.input.column = column;
            }
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            if let Some(log) = failure_log {
                config.output.failure_log = log;
            }
            if let Some(ms) = delay_ms {
                config.retrieval.inter_item_delay_ms = ms;
            }
            config.validate().context("Invalid configuration after applying command-line overrides")?;
            download(config, &input).await
        }
        Commands::Check { input } => {
            let ok = check::run(cli.config.as_deref(), input.as_deref()).await;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load_from(p).with_context(|| format!("Could not load {}", p.display())),
        None => Config::load().context("Could not load patentfetch.toml"),
    }
}

async fn download(config: Config, input: &Path) -> anyhow::Result<ExitCode> {
    info!("patentfetch {}", env!("CARGO_PKG_VERSION"));

    let ids = read_identifiers(input, &config.input.column)
        .with_context(|| format!("Could not read identifiers from {}", input.display()))?;

    let observer = Arc::new(ProgressObserver::new(ids.len()));
    let pipeline = RetrievalPipeline::from_config(&config)
        .context("Could not set up the HTTP client")?
        .with_observer(observer.clone());

    let cancel = CancelFlag::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current patent");
            stop.cancel();
        }
    });

    let summary = Arc::new(pipeline)
        .spawn(ids, cancel)
        .await
        .context("Retrieval task panicked")??;

    observer.finish(&summary);
    print_failures(&summary, &config);
    Ok(exit_code(&summary))
}

fn print_failures(summary: &BatchSummary, config: &Config) {
    if summary.failures.is_empty() {
        return;
    }
    println!();
    for f in &summary.failures {
        println!("  {} {}: {}", console::style("✗").red(), f.original, f.reason);
    }
    println!("Failures appended to {}", config.output.failure_log.display());
}

/// 0 when everything was saved, 1 when any identifier failed, 130 when
/// stopped by Ctrl-C.
fn exit_code(summary: &BatchSummary) -> ExitCode {
    if summary.cancelled {
        ExitCode::from(130)
    } else if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

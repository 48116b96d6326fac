//! rankquest CLI - search relevance metrics for CI and local tuning
//!
//! Replays rated searches against a search backend, compares the metrics to
//! their expected values and reports the result.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::Result;
use clap::Parser;
use rankquest::{run_metrics, RunArgs, EXIT_FATAL};
use rankquest_plugins::default_registry;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rankquest")]
#[command(about = "Evaluate search relevance metrics against rated searches")]
#[command(version)]
struct Cli {
    /// Search plugin configuration (JSON)
    #[arg(short, long, value_name = "FILE")]
    configuration: PathBuf,

    /// Rated searches to replay (JSON)
    #[arg(short, long, value_name = "FILE")]
    test_cases: PathBuf,

    /// Write the metrics as JSON to this file, which must not exist
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Number of rated searches sent to the backend per call [default: 10]
    #[arg(long, value_name = "N")]
    chunk_size: Option<usize>,

    /// Verbose logging and a per rated search table
    #[arg(short, long)]
    verbose: bool,

    /// Exit with status 1 when a metric is below its expected value
    #[arg(short, long)]
    fail: bool,

    /// Run settings file (TOML)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn into_run_args(self) -> RunArgs {
        RunArgs {
            configuration: self.configuration,
            test_cases: self.test_cases,
            output: self.output,
            chunk_size: self.chunk_size,
            verbose: self.verbose,
            fail: self.fail,
            settings: self.settings,
            color: !self.no_color && std::io::stdout().is_terminal(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let args = cli.into_run_args();
    let registry = default_registry();
    let mut stdout = std::io::stdout();

    match run_metrics(&args, &registry, &mut stdout).await {
        Ok(summary) => ExitCode::from(summary.exit_code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Initialize logging system
///
/// Logs go to stderr so stdout only carries the report. `RUST_LOG` takes
/// precedence over the verbosity flag.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rankquest={level},rankquest_core={level},rankquest_plugins={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}

//! Library interface for the rankquest CLI
//!
//! The run coordinator lives here so integration tests can drive a whole run
//! with their own plugin registry and capture the report.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod report;

use anyhow::{Context, Result};
use rankquest_core::{
    load_rated_searches, Evaluation, PluginFactoryRegistry, RunSettings,
    SearchPluginConfiguration,
};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub use report::{ConsoleReport, OutputTarget};

/// Exit status when every metric passed or failing metrics are tolerated
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when a metric is below its expected value and `--fail` is set
pub const EXIT_BELOW_THRESHOLD: u8 = 1;
/// Exit status when the run was aborted before producing a report
pub const EXIT_FATAL: u8 = 2;

/// Stages of a metrics run, entered strictly in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingConfig,
    LoadingTestCases,
    ResolvingPlugin,
    Executing,
    Evaluating,
    Reporting,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadingConfig => "loading configuration",
            Self::LoadingTestCases => "loading test cases",
            Self::ResolvingPlugin => "resolving plugin",
            Self::Executing => "executing",
            Self::Evaluating => "evaluating",
            Self::Reporting => "reporting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Inputs of a single run
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Search plugin configuration (JSON)
    pub configuration: PathBuf,
    /// Rated searches (JSON)
    pub test_cases: PathBuf,
    /// Write a JSON report here instead of printing the metrics
    pub output: Option<PathBuf>,
    /// Overrides the chunk size from the run settings
    pub chunk_size: Option<usize>,
    pub verbose: bool,
    /// Exit with [`EXIT_BELOW_THRESHOLD`] when a metric fails
    pub fail: bool,
    /// Run settings file, defaults to `~/.rankquest/settings.toml`
    pub settings: Option<PathBuf>,
    pub color: bool,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: bool,
    /// Names of the metrics below their expected value
    pub failing_metrics: Vec<String>,
    pub failed_test_cases: usize,
    pub fail_on_violation: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> u8 {
        if self.fail_on_violation && !self.passed {
            EXIT_BELOW_THRESHOLD
        } else {
            EXIT_SUCCESS
        }
    }
}

fn enter(stage: RunStage) {
    debug!(%stage, "Entering stage");
}

/// Load settings, apply the command line override and validate
pub fn load_settings(args: &RunArgs) -> Result<RunSettings> {
    let mut settings =
        RunSettings::load(args.settings.as_deref()).context("Failed to load run settings")?;
    if let Some(chunk_size) = args.chunk_size {
        settings = settings.with_chunk_size(chunk_size);
    }
    settings.validate()?;
    Ok(settings)
}

/// Run the configured metrics and report them to `out` or the output file
///
/// Every error returned here is fatal and happens before the report is
/// written. Failing rated searches and metrics below their threshold are
/// part of the report instead.
pub async fn run_metrics(
    args: &RunArgs,
    registry: &PluginFactoryRegistry,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    enter(RunStage::LoadingConfig);
    let settings = load_settings(args)?;
    let configuration = SearchPluginConfiguration::load(&args.configuration)
        .context("Failed to load search configuration")?;

    enter(RunStage::LoadingTestCases);
    let test_cases =
        load_rated_searches(&args.test_cases).context("Failed to load test cases")?;
    info!(
        "Loaded {} rated searches for '{}'",
        test_cases.len(),
        configuration.name
    );

    // Checked before any search runs
    let target = OutputTarget::prepare(args.output.clone())?;

    enter(RunStage::ResolvingPlugin);
    let plugin = registry
        .resolve(&configuration.plugin_type)?
        .create(&configuration, &settings)
        .with_context(|| format!("Failed to create {} plugin", configuration.plugin_type))?;

    enter(RunStage::Executing);
    let progress = report::create_progress_bar(test_cases.len());
    let outcome = plugin
        .run_metrics(&configuration, &test_cases, &settings, Some(progress))
        .await?;

    enter(RunStage::Evaluating);
    let evaluation = Evaluation::from_outputs(&outcome.outputs);
    let failures = outcome.failures();
    for verdict in evaluation.failing() {
        warn!(
            "Metric {} is {:.4}, expected at least {:.4}",
            verdict.name, verdict.achieved, verdict.expected
        );
    }

    enter(RunStage::Reporting);
    let console = ConsoleReport {
        color: args.color,
        verbose: args.verbose,
    };
    console.render_failures(out, &failures, &outcome.unevaluated)?;
    match &target {
        OutputTarget::Console => console.render_metrics(out, &outcome.outputs, &test_cases)?,
        OutputTarget::File(path) => {
            report::write_json_report(path, &outcome.outputs)?;
            info!("Wrote metrics report to {}", path.display());
        }
    }
    console.render_summary(out, &evaluation, &outcome.unevaluated)?;

    enter(RunStage::Done);
    Ok(RunSummary {
        passed: evaluation.passed(),
        failing_metrics: evaluation.failing_names(),
        failed_test_cases: failures.len(),
        fail_on_violation: args.fail,
    })
}

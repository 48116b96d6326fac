//! Chunked execution of rated searches against a search plugin
//!
//! The runner splits the rated searches into chunks of `chunk_size`, hands each
//! chunk to the plugin in a single call and scores every returned result
//! against all configured metrics. A failing search only fails its own
//! outcome; the run always yields exactly one [`Outcome`] per rated search, in
//! input order, whatever the chunk size or concurrency.

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::RunSettings;
use crate::configuration::{MetricConfiguration, SearchPluginConfiguration};
use crate::error::{Error, Result};
use crate::metrics::{aggregate, compute_metric};
use crate::plugin::SearchPlugin;
use crate::rated_search::RatedSearch;
use crate::search_models::{
    MetricResults, MetricsOutput, Outcome, SearchResults, TestCaseFailure, TestCaseMetrics,
};

/// Everything a metrics run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One outcome per rated search, in input order
    pub outcomes: Vec<Outcome>,
    /// One output per metric that had at least one successful rated search
    pub outputs: Vec<MetricsOutput>,
    /// Metrics that could not be evaluated because every rated search failed
    pub unevaluated: Vec<MetricConfiguration>,
    /// Wall clock time of the whole run
    pub duration: Duration,
}

impl RunOutcome {
    /// Rated searches that failed, in input order
    pub fn failures(&self) -> Vec<&TestCaseFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Failed(f) => Some(f),
                Outcome::Succeeded(_) => None,
            })
            .collect()
    }

    /// Number of rated searches that were evaluated successfully
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

/// Drives a search plugin over rated searches in bounded chunks
pub struct ChunkedRunner<'a, P: SearchPlugin + ?Sized> {
    plugin: &'a P,
    max_concurrent_chunks: usize,
    min_results_to_fetch: usize,
    progress: Option<ProgressBar>,
}

impl<'a, P: SearchPlugin + ?Sized> ChunkedRunner<'a, P> {
    pub fn new(plugin: &'a P) -> Self {
        let defaults = RunSettings::default();
        Self {
            plugin,
            max_concurrent_chunks: defaults.max_concurrent_chunks,
            min_results_to_fetch: defaults.min_results_to_fetch,
            progress: None,
        }
    }

    /// Apply concurrency and fetch size from run settings
    pub fn with_settings(mut self, settings: &RunSettings) -> Self {
        self.max_concurrent_chunks = settings.max_concurrent_chunks;
        self.min_results_to_fetch = settings.min_results_to_fetch;
        self
    }

    /// Number of chunks that may be dispatched at the same time
    pub fn with_max_concurrent_chunks(mut self, max_concurrent_chunks: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent_chunks;
        self
    }

    /// Advance the given progress bar by one per finished rated search
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run all configured metrics over the rated searches
    pub async fn run(
        &self,
        configuration: &SearchPluginConfiguration,
        test_cases: &[RatedSearch],
        chunk_size: usize,
    ) -> Result<RunOutcome> {
        if chunk_size == 0 {
            return Err(Error::invalid_input(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_chunks == 0 {
            return Err(Error::invalid_input(
                "max concurrent chunks must be greater than 0".to_string(),
            ));
        }

        let start = Instant::now();
        let num_results = self.min_results_to_fetch.max(configuration.max_k());
        let num_chunks = test_cases.len().div_ceil(chunk_size);

        info!(
            "Running {} metrics for {} rated searches in {} chunks of up to {}",
            configuration.metrics.len(),
            test_cases.len(),
            num_chunks,
            chunk_size
        );

        // Collected eagerly: a mapping closure over borrowed chunks would make
        // the run future non-`Send`
        let chunk_futures: Vec<_> = test_cases
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk_idx, chunk)| {
                Box::pin(self.run_chunk(configuration, chunk, chunk_idx, num_results))
            })
            .collect();

        // `buffered` keeps chunk order, so outcomes line up with the input
        let chunk_outcomes: Vec<Vec<Outcome>> = stream::iter(chunk_futures)
            .buffered(self.max_concurrent_chunks)
            .collect()
            .await;

        let outcomes: Vec<Outcome> = chunk_outcomes.into_iter().flatten().collect();
        let (outputs, unevaluated) = collect_outputs(configuration, &outcomes);
        let duration = start.elapsed();

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "Evaluated {} rated searches ({} failed) in {:.2}s",
            outcomes.len() - failed,
            failed,
            duration.as_secs_f64()
        );

        Ok(RunOutcome {
            outcomes,
            outputs,
            unevaluated,
            duration,
        })
    }

    async fn run_chunk(
        &self,
        configuration: &SearchPluginConfiguration,
        chunk: &[RatedSearch],
        chunk_idx: usize,
        num_results: usize,
    ) -> Vec<Outcome> {
        debug!(chunk = chunk_idx, size = chunk.len(), "Dispatching chunk");

        let mut fetched = self.plugin.fetch_chunk(chunk, num_results).await;
        if fetched.len() > chunk.len() {
            warn!(
                "Chunk {chunk_idx}: plugin returned {} results for {} rated searches, dropping the surplus",
                fetched.len(),
                chunk.len()
            );
            fetched.truncate(chunk.len());
        }

        let mut fetched = fetched.into_iter();
        let outcomes: Vec<Outcome> = chunk
            .iter()
            .map(|search| match fetched.next() {
                Some(Ok(results)) => Outcome::Succeeded(score(configuration, search, &results)),
                Some(Err(e)) => {
                    warn!(test_case = %search.id, "Rated search failed: {e}");
                    Outcome::Failed(TestCaseFailure {
                        id: search.id.clone(),
                        cause: e.to_string(),
                    })
                }
                None => {
                    warn!(test_case = %search.id, "No result returned by plugin");
                    Outcome::Failed(TestCaseFailure {
                        id: search.id.clone(),
                        cause: "no result returned by plugin".to_string(),
                    })
                }
            })
            .collect();

        if let Some(progress) = &self.progress {
            progress.inc(chunk.len() as u64);
        }
        outcomes
    }
}

fn score(
    configuration: &SearchPluginConfiguration,
    search: &RatedSearch,
    results: &SearchResults,
) -> TestCaseMetrics {
    TestCaseMetrics {
        id: search.id.clone(),
        metrics: configuration
            .metrics
            .iter()
            .map(|metric| compute_metric(metric, search, results))
            .collect(),
    }
}

/// Fold per rated search outcomes into one output per metric configuration
fn collect_outputs(
    configuration: &SearchPluginConfiguration,
    outcomes: &[Outcome],
) -> (Vec<MetricsOutput>, Vec<MetricConfiguration>) {
    let mut outputs = Vec::with_capacity(configuration.metrics.len());
    let mut unevaluated = Vec::new();

    for (idx, metric) in configuration.metrics.iter().enumerate() {
        let details: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Succeeded(m) => m.metrics.get(idx).cloned(),
                Outcome::Failed(_) => None,
            })
            .collect();

        if details.is_empty() {
            warn!("Metric {} has no successful rated searches", metric.name);
            unevaluated.push(metric.clone());
            continue;
        }

        outputs.push(MetricsOutput {
            search_configuration_name: configuration.name.clone(),
            configuration: metric.clone(),
            results: MetricResults {
                metric: aggregate(&details),
                details,
            },
        });
    }

    (outputs, unevaluated)
}

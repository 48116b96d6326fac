//! Search plugin configuration
//!
//! A [`SearchPluginConfiguration`] names the backend type to run against,
//! carries the backend's own settings opaquely, and lists the metrics to
//! evaluate together with their thresholds.

use crate::error::{Error, Result};
use crate::metrics::{MetricKind, DEFAULT_K};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Tunable parameters of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricParams {
    /// Rank cutoff; only the top `k` results are scored
    #[serde(default = "default_k")]
    pub k: usize,

    /// Ratings at or above this value count as relevant
    #[serde(default = "default_relevant_rating_threshold")]
    pub relevant_rating_threshold: i64,

    /// Highest rating on the scale (used by ERR)
    #[serde(default = "default_max_relevance")]
    pub max_relevance: i64,

    /// Use the rating itself as gain instead of `2^rating - 1` (DCG / NDCG)
    #[serde(default)]
    pub use_linear_gains: bool,
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_relevant_rating_threshold() -> i64 {
    1
}

fn default_max_relevance() -> i64 {
    5
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            k: default_k(),
            relevant_rating_threshold: default_relevant_rating_threshold(),
            max_relevance: default_max_relevance(),
            use_linear_gains: false,
        }
    }
}

/// Wire shape of a metric entry before the metric reference is resolved
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetricConfiguration {
    metric: String,
    name: Option<String>,
    #[serde(default)]
    params: Option<Map<String, Value>>,
    expected: Option<f64>,
}

/// A metric to evaluate and the threshold it must reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMetricConfiguration")]
pub struct MetricConfiguration {
    pub metric: MetricKind,
    pub name: String,
    pub params: MetricParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<f64>,
}

impl TryFrom<RawMetricConfiguration> for MetricConfiguration {
    type Error = Error;

    fn try_from(raw: RawMetricConfiguration) -> Result<Self> {
        let (metric, k) = MetricKind::parse_reference(&raw.metric)?;

        let mut params: MetricParams = match raw.params {
            Some(map) => serde_json::from_value(Value::Object(map)).map_err(|e| {
                Error::invalid_input(format!("Invalid params for metric '{}': {e}", raw.metric))
            })?,
            None => MetricParams::default(),
        };
        if let Some(k) = k {
            params.k = k;
        }

        Ok(Self {
            metric,
            name: raw.name.unwrap_or(raw.metric),
            params,
            expected: raw.expected,
        })
    }
}

impl MetricConfiguration {
    /// Create a configuration with default parameters and no explicit threshold
    pub fn new(metric: MetricKind, name: impl Into<String>) -> Self {
        Self {
            metric,
            name: name.into(),
            params: MetricParams::default(),
            expected: None,
        }
    }

    /// Set an explicit threshold
    pub fn with_expected(mut self, expected: f64) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Set the rank cutoff
    pub fn with_k(mut self, k: usize) -> Self {
        self.params.k = k;
        self
    }

    /// The threshold this metric is judged against
    ///
    /// An explicit `expected` always wins over the metric kind's default.
    pub fn expected_value(&self) -> f64 {
        self.expected.unwrap_or(self.metric.default_expected())
    }

    fn validate(&self) -> Result<()> {
        if self.params.k == 0 {
            return Err(Error::config(format!(
                "Metric '{}': k must be greater than 0",
                self.name
            )));
        }
        if self.params.max_relevance <= 0 {
            return Err(Error::config(format!(
                "Metric '{}': maxRelevance must be greater than 0",
                self.name
            )));
        }
        if let Some(expected) = self.expected {
            if !expected.is_finite() {
                return Err(Error::config(format!(
                    "Metric '{}': expected must be a finite number",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration of a search backend and the metrics to evaluate against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPluginConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human readable name used in reports
    pub name: String,

    /// Backend type, used to look up the plugin factory
    pub plugin_type: String,

    /// Metrics to evaluate, in report order
    pub metrics: Vec<MetricConfiguration>,

    /// Backend specific settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_settings: Option<Map<String, Value>>,

    /// Unrecognized top-level keys, treated as backend specific settings
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchPluginConfiguration {
    /// Parse a configuration from JSON text
    pub fn from_json_str(content: &str, source: &str) -> Result<Self> {
        let configuration: Self =
            serde_json::from_str(content).map_err(|e| Error::parse(source, e.to_string()))?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Load a configuration file
    ///
    /// Fails with [`Error::ConfigurationNotFound`] when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigurationNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, &path.display().to_string())
    }

    /// Backend specific settings handed to the plugin factory
    ///
    /// A nested `pluginSettings` object takes precedence; otherwise the unknown
    /// top-level keys of the configuration are used.
    pub fn settings(&self) -> &Map<String, Value> {
        self.plugin_settings.as_ref().unwrap_or(&self.extra)
    }

    /// Largest rank cutoff among the configured metrics
    pub fn max_k(&self) -> usize {
        self.metrics
            .iter()
            .map(|m| m.params.k)
            .max()
            .unwrap_or(DEFAULT_K)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("name must not be empty".to_string()));
        }
        if self.plugin_type.trim().is_empty() {
            return Err(Error::config("pluginType must not be empty".to_string()));
        }
        if self.metrics.is_empty() {
            return Err(Error::config(format!(
                "Configuration '{}' does not define any metrics",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            metric.validate()?;
            if !seen.insert(metric.name.as_str()) {
                return Err(Error::config(format!(
                    "Metric '{}' is configured more than once",
                    metric.name
                )));
            }
        }
        Ok(())
    }
}

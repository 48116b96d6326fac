//! Search results and metric outputs
//!
//! These types form the contract between search plugins, the execution
//! engine and the reporting layer. [`MetricsOutput`] is also the shape of the
//! machine readable report.

use crate::configuration::MetricConfiguration;
use serde::{Deserialize, Serialize};

/// A single document returned by a search backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Ranked results of one search, best first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Total number of matches reported by the backend
    pub total: u64,
    pub response_time_ms: u64,
    #[serde(rename = "searchResultList")]
    pub results: Vec<SearchResult>,
}

impl SearchResults {
    /// Results in rank order with the total set to their count
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        Self {
            total: results.len() as u64,
            response_time_ms: 0,
            results,
        }
    }
}

/// A retrieved document that has a relevance rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedHit {
    pub result: SearchResult,
    pub rating: f64,
}

/// Metric value for a single rated search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Id of the rated search
    pub id: String,
    pub metric: f64,
    /// Retrieved documents that were rated
    pub hits: Vec<RatedHit>,
    /// Retrieved documents without a rating
    #[serde(rename = "unRated")]
    pub unrated: Vec<SearchResult>,
}

/// Overall value of a metric plus the per rated search breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResults {
    pub metric: f64,
    pub details: Vec<MetricResult>,
}

/// Result of evaluating one metric configuration over a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsOutput {
    pub search_configuration_name: String,
    pub configuration: MetricConfiguration,
    pub results: MetricResults,
}

/// Metric values of one successfully executed rated search
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseMetrics {
    pub id: String,
    /// One entry per configured metric, in configuration order
    pub metrics: Vec<MetricResult>,
}

/// A rated search that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseFailure {
    pub id: String,
    pub cause: String,
}

impl std::fmt::Display for TestCaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.cause)
    }
}

/// What happened to a single rated search; never both success and failure
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded(TestCaseMetrics),
    Failed(TestCaseFailure),
}

impl Outcome {
    /// Id of the rated search this outcome belongs to
    pub fn id(&self) -> &str {
        match self {
            Self::Succeeded(m) => &m.id,
            Self::Failed(f) => &f.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

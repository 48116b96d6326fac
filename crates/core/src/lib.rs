//! Core types and pipeline for rankquest search relevance evaluation
//!
//! This crate provides the pieces of a metrics run that do not depend on a
//! particular search backend:
//!
//! - **Configuration**: search plugin configuration, metric thresholds, run settings
//! - **Rated searches**: the test cases and their relevance judgments
//! - **Plugins**: the search plugin trait and the factory registry
//! - **Engine**: chunked execution that tolerates failing rated searches
//! - **Evaluation**: threshold comparison per metric and per rated search
//! - **Error handling**: unified error types
//!

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod configuration;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod plugin;
pub mod rated_search;
pub mod search_models;

// Re-export main types for convenience
pub use config::RunSettings;
pub use configuration::{MetricConfiguration, MetricParams, SearchPluginConfiguration};
pub use engine::{ChunkedRunner, RunOutcome};
pub use error::{Error, Result, ResultExt};
pub use evaluation::{Evaluation, MetricVerdict, RowVerdict};
pub use metrics::MetricKind;
pub use plugin::{PluginFactory, PluginFactoryRegistry, SearchPlugin};
pub use rated_search::{load_rated_searches, RatedSearch, SearchContext, SearchResultRating};
pub use search_models::{
    MetricResult, MetricResults, MetricsOutput, Outcome, RatedHit, SearchResult, SearchResults,
    TestCaseFailure, TestCaseMetrics,
};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::configuration::SearchPluginConfiguration;
    pub use crate::error::{Result, ResultExt};
    pub use crate::plugin::{PluginFactory, SearchPlugin};
    pub use crate::rated_search::RatedSearch;
}

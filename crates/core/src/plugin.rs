//! Search plugin abstraction and the factory registry
//!
//! A plugin executes the search of a rated search against one kind of backend.
//! Factories are registered under the backend type name used in
//! `SearchPluginConfiguration::plugin_type`.

use async_trait::async_trait;
use futures::future::join_all;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::RunSettings;
use crate::configuration::SearchPluginConfiguration;
use crate::engine::{ChunkedRunner, RunOutcome};
use crate::error::{Error, Result};
use crate::rated_search::{RatedSearch, SearchContext};
use crate::search_models::SearchResults;

/// Trait for search backends
#[async_trait]
pub trait SearchPlugin: Send + Sync {
    /// Execute a single search and return its results in rank order
    ///
    /// # Arguments
    /// * `search_context` - Parameters of the search
    /// * `num_results` - Number of results the metrics need
    async fn fetch(&self, search_context: &SearchContext, num_results: usize)
        -> Result<SearchResults>;

    /// Execute the searches of one chunk of rated searches
    ///
    /// Returns one result per rated search, in the same order. The default
    /// issues the chunk's searches concurrently; backends with a native batch
    /// API can override this.
    async fn fetch_chunk(
        &self,
        searches: &[RatedSearch],
        num_results: usize,
    ) -> Vec<Result<SearchResults>> {
        join_all(
            searches
                .iter()
                .map(|search| self.fetch(&search.search_context, num_results)),
        )
        .await
    }

    /// Run every configured metric over the rated searches
    ///
    /// Chunk size, concurrency and fetch size come from `settings`. The
    /// progress bar, when given, advances once per finished rated search.
    async fn run_metrics(
        &self,
        configuration: &SearchPluginConfiguration,
        test_cases: &[RatedSearch],
        settings: &RunSettings,
        progress: Option<ProgressBar>,
    ) -> Result<RunOutcome> {
        let mut runner = ChunkedRunner::new(self).with_settings(settings);
        if let Some(progress) = progress {
            runner = runner.with_progress(progress);
        }
        runner
            .run(configuration, test_cases, settings.chunk_size)
            .await
    }
}

/// Creates plugin instances for one backend type
pub trait PluginFactory: Send + Sync {
    /// Backend type name this factory is registered under
    fn plugin_type(&self) -> &str;

    /// Create a plugin for the given configuration
    fn create(
        &self,
        configuration: &SearchPluginConfiguration,
        settings: &RunSettings,
    ) -> Result<Arc<dyn SearchPlugin>>;
}

/// Maps backend type names to plugin factories
#[derive(Default, Clone)]
pub struct PluginFactoryRegistry {
    factories: HashMap<String, Arc<dyn PluginFactory>>,
}

impl PluginFactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its plugin type
    ///
    /// A factory registered later for the same type replaces the earlier one.
    pub fn register(&mut self, factory: Arc<dyn PluginFactory>) -> &mut Self {
        let plugin_type = factory.plugin_type().to_string();
        if self.factories.insert(plugin_type.clone(), factory).is_some() {
            debug!("Replaced plugin factory for {plugin_type}");
        }
        self
    }

    /// Look up a factory by exact plugin type
    pub fn get(&self, plugin_type: &str) -> Option<Arc<dyn PluginFactory>> {
        self.factories.get(plugin_type).cloned()
    }

    /// Look up a factory, failing with [`Error::UnknownPluginType`]
    pub fn resolve(&self, plugin_type: &str) -> Result<Arc<dyn PluginFactory>> {
        self.get(plugin_type)
            .ok_or_else(|| Error::UnknownPluginType {
                plugin_type: plugin_type.to_string(),
                available: self.plugin_types(),
            })
    }

    /// Registered plugin types, sorted
    pub fn plugin_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for PluginFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactoryRegistry")
            .field("plugin_types", &self.plugin_types())
            .finish()
    }
}

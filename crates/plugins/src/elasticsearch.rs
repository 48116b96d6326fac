//! Elasticsearch search plugin

use async_trait::async_trait;
use rankquest_core::rated_search::context_value_to_string;
use rankquest_core::{
    PluginFactory, Result, RunSettings, SearchContext, SearchPlugin, SearchPluginConfiguration,
    SearchResult, SearchResults,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::PluginError;
use crate::http::{build_client, send_json};
use crate::template::{lookup_path, render_template};

const PLUGIN_TYPE: &str = "ElasticSearch";

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

/// Settings of the Elasticsearch plugin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticSearchSettings {
    /// Base URL of the cluster
    #[serde(default = "default_url")]
    pub url: String,

    /// Index or alias to search
    pub index: String,

    /// Query DSL with `{{param}}` placeholders, as a JSON object or a string
    pub query_template: Value,

    /// `_source` fields tried in order for a result label
    #[serde(default)]
    pub label_fields: Vec<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl ElasticSearchSettings {
    /// Read the settings from a search configuration
    pub fn from_configuration(
        configuration: &SearchPluginConfiguration,
    ) -> std::result::Result<Self, PluginError> {
        let mut settings: Self =
            serde_json::from_value(Value::Object(configuration.settings().clone())).map_err(
                |e| PluginError::ConfigError(format!("Invalid {PLUGIN_TYPE} settings: {e}")),
            )?;

        if let Value::String(template) = &settings.query_template {
            settings.query_template = serde_json::from_str(template).map_err(|e| {
                PluginError::ConfigError(format!("queryTemplate is not valid JSON: {e}"))
            })?;
        }
        if !settings.query_template.is_object() {
            return Err(PluginError::ConfigError(
                "queryTemplate must be a JSON object".to_string(),
            ));
        }
        if settings.index.trim().is_empty() {
            return Err(PluginError::ConfigError("index must not be empty".to_string()));
        }
        Ok(settings)
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.url.trim_end_matches('/'), self.index)
    }
}

/// Runs templated queries against an Elasticsearch index
pub struct ElasticSearchPlugin {
    client: Client,
    settings: ElasticSearchSettings,
}

impl ElasticSearchPlugin {
    pub fn new(
        settings: ElasticSearchSettings,
        timeout_secs: u64,
    ) -> std::result::Result<Self, PluginError> {
        info!("Initializing Elasticsearch plugin");
        info!("  URL: {}", settings.url);
        info!("  Index: {}", settings.index);

        Ok(Self {
            client: build_client(timeout_secs)?,
            settings,
        })
    }

    fn request_body(
        &self,
        search_context: &SearchContext,
        num_results: usize,
    ) -> std::result::Result<Value, PluginError> {
        let mut body = render_template(&self.settings.query_template, search_context)?;
        if let Value::Object(map) = &mut body {
            map.insert("size".to_string(), Value::from(num_results));
        }
        Ok(body)
    }

    fn label(&self, hit: &Value) -> Option<String> {
        let source = hit.get("_source")?;
        self.settings
            .label_fields
            .iter()
            .find_map(|field| lookup_path(source, field))
            .map(context_value_to_string)
    }

    fn parse_response(&self, response: &Value) -> std::result::Result<Vec<SearchResult>, PluginError> {
        let hits = lookup_path(response, "hits.hits")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PluginError::ResponseError("response has no hits.hits array".to_string())
            })?;

        hits.iter()
            .map(|hit| {
                let id = hit.get("_id").map(context_value_to_string).ok_or_else(|| {
                    PluginError::ResponseError("search hit without _id".to_string())
                })?;
                Ok(match self.label(hit) {
                    Some(label) => SearchResult::new(id).with_label(label),
                    None => SearchResult::new(id),
                })
            })
            .collect()
    }
}

/// Total hit count in either the 7.x object form or the older plain number
fn total_hits(response: &Value) -> Option<u64> {
    let total = lookup_path(response, "hits.total")?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
}

#[async_trait]
impl SearchPlugin for ElasticSearchPlugin {
    async fn fetch(&self, search_context: &SearchContext, num_results: usize) -> Result<SearchResults> {
        let body = self.request_body(search_context, num_results)?;
        let url = self.settings.search_url();
        debug!("POST {url}: {body}");

        let mut request = self.client.post(&url).json(&body);
        if let Some(user) = &self.settings.user {
            request = request.basic_auth(user, self.settings.password.as_ref());
        }

        let start = Instant::now();
        let response = send_json(request, &url).await?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let results = self.parse_response(&response)?;
        Ok(SearchResults {
            total: total_hits(&response).unwrap_or(results.len() as u64),
            response_time_ms,
            results,
        })
    }
}

/// Factory for [`ElasticSearchPlugin`]
pub struct ElasticSearchPluginFactory;

impl PluginFactory for ElasticSearchPluginFactory {
    fn plugin_type(&self) -> &str {
        PLUGIN_TYPE
    }

    fn create(
        &self,
        configuration: &SearchPluginConfiguration,
        settings: &RunSettings,
    ) -> Result<Arc<dyn SearchPlugin>> {
        let es_settings = ElasticSearchSettings::from_configuration(configuration)?;
        let plugin = ElasticSearchPlugin::new(es_settings, settings.request_timeout_secs)?;
        Ok(Arc::new(plugin))
    }
}

//! Plugins for generic JSON search APIs
//!
//! The same plugin serves GET and POST APIs. Results are located in the
//! response through dotted paths configured per API.

use async_trait::async_trait;
use rankquest_core::rated_search::context_value_to_string;
use rankquest_core::{
    PluginFactory, Result, RunSettings, SearchContext, SearchPlugin, SearchPluginConfiguration,
    SearchResult, SearchResults,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::PluginError;
use crate::http::{build_client, send_json};
use crate::template::{lookup_path, render_template};

const GET_PLUGIN_TYPE: &str = "JsonGetAPIPlugin";
const POST_PLUGIN_TYPE: &str = "JsonPostAPIPlugin";

/// How the search context is sent to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// Context entries become query parameters
    Get,
    /// Context (or the rendered body template) is the JSON body
    Post,
}

/// Settings shared by the JSON API plugins
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonApiSettings {
    pub search_url: String,

    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Path to the array of hits; empty when the body is the array itself
    #[serde(default)]
    pub path_to_hits: String,

    /// Path to the document id within a hit
    pub path_to_id: String,

    #[serde(default)]
    pub path_to_label: Option<String>,

    /// POST only: body with `{{param}}` placeholders
    #[serde(default)]
    pub request_body_template: Option<Value>,
}

impl JsonApiSettings {
    pub fn from_configuration(
        configuration: &SearchPluginConfiguration,
        plugin_type: &str,
    ) -> std::result::Result<Self, PluginError> {
        let settings: Self =
            serde_json::from_value(Value::Object(configuration.settings().clone())).map_err(
                |e| PluginError::ConfigError(format!("Invalid {plugin_type} settings: {e}")),
            )?;
        if settings.search_url.trim().is_empty() {
            return Err(PluginError::ConfigError(
                "searchUrl must not be empty".to_string(),
            ));
        }
        Ok(settings)
    }
}

/// Queries a JSON search API over HTTP
pub struct JsonApiPlugin {
    client: Client,
    method: RequestMethod,
    settings: JsonApiSettings,
}

impl JsonApiPlugin {
    pub fn new(
        settings: JsonApiSettings,
        method: RequestMethod,
        timeout_secs: u64,
    ) -> std::result::Result<Self, PluginError> {
        info!("Initializing JSON API plugin ({method:?} {})", settings.search_url);
        Ok(Self {
            client: build_client(timeout_secs)?,
            method,
            settings,
        })
    }

    fn parse_response(&self, response: &Value) -> std::result::Result<Vec<SearchResult>, PluginError> {
        let hits = lookup_path(response, &self.settings.path_to_hits)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PluginError::ResponseError(format!(
                    "no hits array at '{}'",
                    self.settings.path_to_hits
                ))
            })?;

        hits.iter()
            .map(|hit| {
                let id = lookup_path(hit, &self.settings.path_to_id)
                    .map(context_value_to_string)
                    .ok_or_else(|| {
                        PluginError::ResponseError(format!(
                            "hit without id at '{}'",
                            self.settings.path_to_id
                        ))
                    })?;
                let label = self
                    .settings
                    .path_to_label
                    .as_deref()
                    .and_then(|path| lookup_path(hit, path))
                    .map(context_value_to_string);
                Ok(match label {
                    Some(label) => SearchResult::new(id).with_label(label),
                    None => SearchResult::new(id),
                })
            })
            .collect()
    }
}

#[async_trait]
impl SearchPlugin for JsonApiPlugin {
    async fn fetch(&self, search_context: &SearchContext, _num_results: usize) -> Result<SearchResults> {
        let url = &self.settings.search_url;
        let mut request = match self.method {
            RequestMethod::Get => {
                let params: Vec<(&str, String)> = search_context
                    .iter()
                    .map(|(k, v)| (k.as_str(), context_value_to_string(v)))
                    .collect();
                debug!("GET {url} {params:?}");
                self.client.get(url).query(&params)
            }
            RequestMethod::Post => {
                let body = match &self.settings.request_body_template {
                    Some(template) => render_template(template, search_context)?,
                    None => Value::Object(search_context.clone()),
                };
                debug!("POST {url}: {body}");
                self.client.post(url).json(&body)
            }
        };
        for (name, value) in &self.settings.request_headers {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let response = send_json(request, url).await?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let results = self.parse_response(&response)?;
        Ok(SearchResults {
            total: results.len() as u64,
            response_time_ms,
            results,
        })
    }
}

fn create_plugin(
    configuration: &SearchPluginConfiguration,
    settings: &RunSettings,
    plugin_type: &str,
    method: RequestMethod,
) -> Result<Arc<dyn SearchPlugin>> {
    let api_settings = JsonApiSettings::from_configuration(configuration, plugin_type)?;
    let plugin = JsonApiPlugin::new(api_settings, method, settings.request_timeout_secs)?;
    Ok(Arc::new(plugin))
}

/// Factory for GET based JSON APIs
pub struct JsonGetApiPluginFactory;

impl PluginFactory for JsonGetApiPluginFactory {
    fn plugin_type(&self) -> &str {
        GET_PLUGIN_TYPE
    }

    fn create(
        &self,
        configuration: &SearchPluginConfiguration,
        settings: &RunSettings,
    ) -> Result<Arc<dyn SearchPlugin>> {
        create_plugin(configuration, settings, GET_PLUGIN_TYPE, RequestMethod::Get)
    }
}

/// Factory for POST based JSON APIs
pub struct JsonPostApiPluginFactory;

impl PluginFactory for JsonPostApiPluginFactory {
    fn plugin_type(&self) -> &str {
        POST_PLUGIN_TYPE
    }

    fn create(
        &self,
        configuration: &SearchPluginConfiguration,
        settings: &RunSettings,
    ) -> Result<Arc<dyn SearchPlugin>> {
        create_plugin(configuration, settings, POST_PLUGIN_TYPE, RequestMethod::Post)
    }
}

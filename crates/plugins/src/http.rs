//! Shared HTTP plumbing for the built-in plugins

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::error::PluginError;

/// Build a client that applies the request timeout to every call
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, PluginError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PluginError::ConfigError(format!("Failed to create HTTP client: {e}")))
}

/// Send a request and parse the JSON body of a successful response
pub(crate) async fn send_json(request: RequestBuilder, target: &str) -> Result<Value, PluginError> {
    let response = request.send().await.map_err(|e| {
        let error_kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connection"
        } else if e.is_request() {
            "request build"
        } else {
            "unknown"
        };
        warn!("Request to {target} failed ({error_kind}): {e}");
        PluginError::RequestError(format!("{target} ({error_kind}): {e}"))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        warn!("{target} returned error {status}: {error_text}");
        return Err(PluginError::ResponseError(format!(
            "{target} returned error {status}: {error_text}"
        )));
    }

    response.json().await.map_err(|e| {
        PluginError::ResponseError(format!("Failed to parse response from {target}: {e}"))
    })
}

//! Error types for the search plugins

use std::fmt;

/// Errors raised while configuring or querying a search backend
#[derive(Debug)]
pub enum PluginError {
    /// Plugin settings are missing or malformed
    ConfigError(String),

    /// The request could not be sent or timed out
    RequestError(String),

    /// The backend answered with an error status or an unusable body
    ResponseError(String),
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Plugin configuration error: {msg}"),
            Self::RequestError(msg) => write!(f, "Search request failed: {msg}"),
            Self::ResponseError(msg) => write!(f, "Invalid search response: {msg}"),
        }
    }
}

impl std::error::Error for PluginError {}

impl From<PluginError> for rankquest_core::Error {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::ConfigError(msg) => rankquest_core::Error::Config(msg),
            other => rankquest_core::Error::Search(other.to_string()),
        }
    }
}

//! Built-in search plugins for rankquest
//!
//! Every plugin talks HTTP through `reqwest` and is registered under the
//! plugin type used in search configurations:
//!
//! - `ElasticSearch`: query DSL templates against an Elasticsearch index
//! - `JsonGetAPIPlugin`: a JSON search API queried with GET parameters
//! - `JsonPostAPIPlugin`: a JSON search API queried with a POST body

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use rankquest_core::PluginFactoryRegistry;
use std::sync::Arc;

mod elasticsearch;
pub mod error;
mod http;
mod json_api;
mod template;

pub use elasticsearch::{ElasticSearchPlugin, ElasticSearchPluginFactory, ElasticSearchSettings};
pub use error::PluginError;
pub use json_api::{
    JsonApiPlugin, JsonApiSettings, JsonGetApiPluginFactory, JsonPostApiPluginFactory,
    RequestMethod,
};
pub use template::{lookup_path, render_template};

/// Registry with every built-in plugin factory
pub fn default_registry() -> PluginFactoryRegistry {
    let mut registry = PluginFactoryRegistry::new();
    registry
        .register(Arc::new(ElasticSearchPluginFactory))
        .register(Arc::new(JsonGetApiPluginFactory))
        .register(Arc::new(JsonPostApiPluginFactory));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_types() {
        assert_eq!(
            default_registry().plugin_types(),
            vec!["ElasticSearch", "JsonGetAPIPlugin", "JsonPostAPIPlugin"]
        );
    }
}

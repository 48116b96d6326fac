//! End-to-end tests of the core pipeline through the public API:
//! configuration loading, plugin resolution, chunked execution and evaluation.

use async_trait::async_trait;
use rankquest_core::{
    load_rated_searches, Error, Evaluation, PluginFactory, PluginFactoryRegistry, Result,
    RunSettings, SearchContext, SearchPlugin, SearchPluginConfiguration, SearchResult,
    SearchResults,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Serves canned results from the `results` settings object, keyed by query
struct CannedPlugin {
    results: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
impl SearchPlugin for CannedPlugin {
    async fn fetch(
        &self,
        search_context: &SearchContext,
        _num_results: usize,
    ) -> Result<SearchResults> {
        let q = search_context
            .get("q")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::search("search context has no q"))?;
        let ids = self
            .results
            .get(q)
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::search(format!("backend error for query '{q}'")))?;
        Ok(SearchResults::from_results(
            ids.iter()
                .filter_map(|id| id.as_str())
                .map(SearchResult::new)
                .collect(),
        ))
    }
}

struct CannedFactory;

impl PluginFactory for CannedFactory {
    fn plugin_type(&self) -> &str {
        "Canned"
    }

    fn create(
        &self,
        configuration: &SearchPluginConfiguration,
        _settings: &RunSettings,
    ) -> Result<Arc<dyn SearchPlugin>> {
        let results = configuration
            .settings()
            .get("results")
            .and_then(|v| v.as_object())
            .cloned()
            .ok_or_else(|| Error::config("Canned plugin requires results"))?;
        Ok(Arc::new(CannedPlugin { results }))
    }
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

fn registry() -> PluginFactoryRegistry {
    let mut registry = PluginFactoryRegistry::new();
    registry.register(Arc::new(CannedFactory));
    registry
}

#[tokio::test]
async fn test_precision_scenario_with_boundary_pass() {
    // precision@4 against expected 0.5: one query scores 0.25, the other 0.75
    let config = write_temp(
        r#"{
            "pluginType": "Canned",
            "name": "canned",
            "metrics": [{ "metric": "precision@4", "expected": 0.5 }],
            "results": {
                "weak": ["a", "x", "y", "z"],
                "strong": ["a", "b", "c", "z"]
            }
        }"#,
    );
    let test_cases = write_temp(
        r#"[
            { "id": "tc-1", "searchContext": { "q": "weak" },
              "ratings": [{ "documentId": "a", "rating": 1 }] },
            { "id": "tc-2", "searchContext": { "q": "strong" },
              "ratings": [{ "documentId": "a", "rating": 1 }, { "documentId": "b", "rating": 2 }, { "documentId": "c", "rating": 1 }] }
        ]"#,
    );

    let configuration =
        SearchPluginConfiguration::load(config.path()).expect("Failed to load configuration");
    let test_cases = load_rated_searches(test_cases.path()).expect("Failed to load test cases");

    let settings = RunSettings::default();
    let plugin = registry()
        .resolve(&configuration.plugin_type)
        .expect("Canned should be registered")
        .create(&configuration, &settings)
        .expect("Failed to create plugin");

    let outcome = plugin
        .run_metrics(&configuration, &test_cases, &settings, None)
        .await
        .expect("run should succeed");

    let evaluation = Evaluation::from_outputs(&outcome.outputs);
    let verdict = &evaluation.verdicts[0];
    assert_eq!(verdict.achieved, 0.5);
    assert!(verdict.passed, "equal to threshold passes");
    assert!(!verdict.rows[0].passed);
    assert!(verdict.rows[1].passed);
    assert!(evaluation.passed());
}

#[tokio::test]
async fn test_backend_error_is_isolated_to_its_test_case() {
    let config = write_temp(
        r#"{
            "pluginType": "Canned",
            "name": "canned",
            "metrics": [{ "metric": "mrr", "expected": 0.9 }],
            "results": { "ok": ["a"] }
        }"#,
    );
    let configuration =
        SearchPluginConfiguration::load(config.path()).expect("Failed to load configuration");

    let test_cases: Vec<_> = (1..=10)
        .map(|i| {
            let q = if i == 7 { "broken" } else { "ok" };
            serde_json::from_value(serde_json::json!({
                "id": format!("tc-{i}"),
                "searchContext": { "q": q },
                "ratings": [{ "documentId": "a", "rating": 1 }]
            }))
            .expect("valid rated search")
        })
        .collect();

    let settings = RunSettings::default().with_chunk_size(3);
    let plugin = CannedFactory
        .create(&configuration, &settings)
        .expect("Failed to create plugin");
    let outcome = plugin
        .run_metrics(&configuration, &test_cases, &settings, None)
        .await
        .expect("run should succeed");

    assert_eq!(outcome.outcomes.len(), 10);
    assert_eq!(outcome.succeeded(), 9);
    assert_eq!(outcome.failures()[0].id, "tc-7");
    assert_eq!(outcome.outputs[0].results.details.len(), 9);
    assert_eq!(outcome.outputs[0].results.metric, 1.0);
    assert!(Evaluation::from_outputs(&outcome.outputs).passed());
}

#[test]
fn test_unknown_plugin_type_is_fatal() {
    let config = write_temp(
        r#"{ "pluginType": "mystery", "name": "x", "metrics": [{ "metric": "ndcg" }] }"#,
    );
    let configuration =
        SearchPluginConfiguration::load(config.path()).expect("Failed to load configuration");

    let err = registry()
        .resolve(&configuration.plugin_type)
        .err()
        .expect("mystery is not registered");
    assert!(err.is_fatal());
    assert!(err.to_string().contains("mystery"));
}

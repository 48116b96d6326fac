//! Rated searches: the test cases of a metrics run

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Parameters of a search, e.g. `{"q": "star wars"}`
pub type SearchContext = Map<String, Value>;

/// A human judgment of how relevant a document is for a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRating {
    pub document_id: String,
    pub rating: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A search plus the relevance judgments for its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedSearch {
    pub id: String,
    #[serde(default)]
    pub search_context: SearchContext,
    #[serde(default, alias = "ratedDocuments")]
    pub ratings: Vec<SearchResultRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RatedSearch {
    /// Ratings keyed by document id
    pub fn ratings_by_document(&self) -> HashMap<&str, i64> {
        self.ratings
            .iter()
            .map(|r| (r.document_id.as_str(), r.rating))
            .collect()
    }

    /// Render the search context as `key=value` pairs for display
    pub fn context_summary(&self) -> String {
        self.search_context
            .iter()
            .map(|(k, v)| format!("{k}={}", context_value_to_string(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// String form of a search context value, without quotes around strings
pub fn context_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse rated searches from JSON text and check their ids are unique
pub fn parse_rated_searches(content: &str, source: &str) -> Result<Vec<RatedSearch>> {
    let searches: Vec<RatedSearch> =
        serde_json::from_str(content).map_err(|e| Error::parse(source, e.to_string()))?;

    let mut seen = HashSet::new();
    for search in &searches {
        if !seen.insert(search.id.as_str()) {
            return Err(Error::invalid_input(format!(
                "Duplicate test case id '{}' in {source}",
                search.id
            )));
        }
    }
    Ok(searches)
}

/// Load rated searches from a file
///
/// Fails with [`Error::TestCasesNotFound`] when the file does not exist.
pub fn load_rated_searches(path: &Path) -> Result<Vec<RatedSearch>> {
    if !path.exists() {
        return Err(Error::TestCasesNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_rated_searches(&content, &path.display().to_string())
}

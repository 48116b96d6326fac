//! `{{param}}` templates and dotted JSON paths
//!
//! Templates are JSON documents whose strings may contain placeholders naming
//! search context entries. A string that consists of a single placeholder is
//! replaced by the context value itself, so numbers and arrays keep their
//! type. Placeholders embedded in longer strings are replaced textually.

use rankquest_core::rated_search::context_value_to_string;
use rankquest_core::SearchContext;
use serde_json::Value;

use crate::error::PluginError;

/// Substitute search context values into a JSON template
pub fn render_template(template: &Value, context: &SearchContext) -> Result<Value, PluginError> {
    match template {
        Value::String(s) => render_string(s, context),
        Value::Array(items) => items
            .iter()
            .map(|item| render_template(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                rendered.insert(key.clone(), render_template(value, context)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

fn render_string(s: &str, context: &SearchContext) -> Result<Value, PluginError> {
    if let Some(name) = whole_placeholder(s) {
        return lookup_param(name, context).cloned();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = rest[start + 2..start + 2 + len].trim();
        out.push_str(&context_value_to_string(lookup_param(name, context)?));
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

fn whole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    (!inner.contains("{{") && !inner.contains("}}")).then(|| inner.trim())
}

fn lookup_param<'a>(name: &str, context: &'a SearchContext) -> Result<&'a Value, PluginError> {
    context.get(name).ok_or_else(|| {
        PluginError::RequestError(format!("search context has no value for '{name}'"))
    })
}

/// Follow a dotted path (`data.items`, `hits.0.id`) into a JSON value
///
/// Array elements are addressed by index. An empty path returns the value
/// itself.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context() -> SearchContext {
        match json!({ "q": "star wars", "year": 1977 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_whole_placeholder_keeps_type() {
        let rendered = render_template(
            &json!({ "query": { "match": { "title": "{{q}}" } }, "year": "{{ year }}" }),
            &context(),
        )
        .expect("render should succeed");
        assert_eq!(
            rendered,
            json!({ "query": { "match": { "title": "star wars" } }, "year": 1977 })
        );
    }

    #[test]
    fn test_embedded_placeholders_are_textual() {
        let rendered = render_template(&json!("{{q}} ({{year}})"), &context())
            .expect("render should succeed");
        assert_eq!(rendered, json!("star wars (1977)"));
    }

    #[test]
    fn test_missing_param_is_an_error() {
        let err = render_template(&json!({ "q": "{{missing}}" }), &context())
            .err()
            .expect("missing parameter should fail");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_unclosed_placeholder_is_literal() {
        let rendered =
            render_template(&json!("{{q"), &context()).expect("render should succeed");
        assert_eq!(rendered, json!("{{q"));
    }

    #[test]
    fn test_lookup_path() {
        let doc = json!({ "data": { "items": [{ "id": "a" }, { "id": "b" }] } });
        assert_eq!(lookup_path(&doc, "data.items.1.id"), Some(&json!("b")));
        assert_eq!(lookup_path(&doc, ""), Some(&doc));
        assert_eq!(lookup_path(&doc, "data.missing"), None);
        assert_eq!(lookup_path(&doc, "data.items.x"), None);
    }
}

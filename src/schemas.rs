//! Domain records exchanged between nodes and external capabilities.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A derived web-search query for the clothing pipeline.
///
/// Produced by the extract node from the user's question; later nodes may
/// refine individual fields, so the state reducer merges field-wise: a
/// populated field in a newer update overlays the older value, untouched
/// fields survive.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The free-text search string.
    pub query: String,
    /// Optional garment category constraint (e.g. "dresses").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional color constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            color: None,
        }
    }

    /// Overlay `other`'s populated fields onto this query.
    #[must_use]
    pub fn merged_with(mut self, other: &SearchQuery) -> Self {
        if !other.query.is_empty() {
            self.query = other.query.clone();
        }
        if other.category.is_some() {
            self.category = other.category.clone();
        }
        if other.color.is_some() {
            self.color = other.color.clone();
        }
        self
    }
}

/// One raw hit returned by the web-search capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Source page URL.
    pub url: String,
    /// Snippet or page content returned by the search API.
    #[serde(default)]
    pub content: String,
}

/// A clothing item extracted from fetched page content.
///
/// All fields are optional: extraction works chunk-by-chunk over arbitrary
/// pages and partial records are expected.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ClothingItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL of the page the item was extracted from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A document returned by the retriever.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: FxHashMap<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: FxHashMap::default(),
        }
    }
}

/// Tagged result of a tool invocation, carried in state so continuation
/// logic can react to failure without re-raising.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { payload: Value },
    Error { user_message: String },
}

impl ToolOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_query_merge_overlays_populated_fields() {
        let base = SearchQuery::new("red dress");
        let refinement = SearchQuery {
            query: String::new(),
            category: Some("dresses".into()),
            color: None,
        };
        let merged = base.merged_with(&refinement);
        assert_eq!(merged.query, "red dress");
        assert_eq!(merged.category.as_deref(), Some("dresses"));
        assert!(merged.color.is_none());
    }

    #[test]
    fn tool_outcome_serializes_with_status_tag() {
        let ok = ToolOutcome::Success {
            payload: json!("fine"),
        };
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["status"], "success");

        let err = ToolOutcome::Error {
            user_message: "sorry".into(),
        };
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["status"], "error");
        assert!(!err.is_success());
    }

    #[test]
    fn search_hit_defaults_missing_content() {
        let hit: SearchHit = serde_json::from_value(json!({"url": "https://a.example"})).unwrap();
        assert_eq!(hit.url, "https://a.example");
        assert!(hit.content.is_empty());
    }
}

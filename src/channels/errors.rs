//! Structured error events accumulated in the errors channel.
//!
//! Recoverable failures (skipped links, grading misses, retry exhaustion)
//! are recorded here instead of aborting the run. Fatal failures use
//! [`NodeError`](crate::node::NodeError) / [`EngineError`](crate::app::EngineError)
//! and still leave one final `ErrorEvent` behind for inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An error event with scope, cause chain, tags, and free-form context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: CauseChain,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// Create a node-scoped error event.
    pub fn node<S: Into<String>>(node: S, step: u64, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                node: node.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create an engine-scoped error event.
    pub fn engine(step: u64, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Engine { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a run-scoped error event.
    pub fn run<S: Into<String>>(run_id: S, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Run {
                run_id: run_id.into(),
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Where in the run an error originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        node: String,
        step: u64,
    },
    Engine {
        step: u64,
    },
    Run {
        run_id: String,
    },
    #[default]
    App,
}

/// A message with an optional nested cause and free-form details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CauseChain {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<CauseChain>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for CauseChain {
    fn default() -> Self {
        CauseChain {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for CauseChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CauseChain {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl CauseChain {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        CauseChain {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: CauseChain) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cause_chain_links_and_roundtrips() {
        let inner = CauseChain::msg("timed out").with_details(json!({"url": "https://x"}));
        let outer = CauseChain::msg("fetch failed").with_cause(inner.clone());
        assert_eq!(outer.cause.as_ref().unwrap().message, inner.message);

        let ser = serde_json::to_string(&outer).unwrap();
        let de: CauseChain = serde_json::from_str(&ser).unwrap();
        assert_eq!(de, outer);
    }

    #[test]
    fn error_scope_serde_uses_tagged_form() {
        let scope = ErrorScope::Node {
            node: "clothing_parse".into(),
            step: 4,
        };
        let v = serde_json::to_value(&scope).unwrap();
        assert_eq!(v["scope"], "node");
        assert_eq!(v["node"], "clothing_parse");
        assert_eq!(serde_json::from_value::<ErrorScope>(v).unwrap(), scope);
    }

    #[test]
    fn event_constructors_set_scope() {
        let ev = ErrorEvent::node("retrieve", 2, CauseChain::msg("backend down"))
            .with_tag("retryable")
            .with_context(json!({"attempt": 1}));
        assert!(matches!(ev.scope, ErrorScope::Node { .. }));
        assert_eq!(ev.tags, vec!["retryable".to_string()]);
        assert_eq!(ev.context["attempt"], 1);
    }
}

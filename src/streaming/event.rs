//! Incremental output events.

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schemas::ClothingItem;

/// Classifies a [`StreamEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Control-flow marker (run/tool/LLM boundaries).
    Signal,
    /// One chunk of generated text.
    Token,
    /// A tool or subgraph started (or failed terminally).
    Action,
    /// Informational key/value payload.
    Metadata,
    /// One extracted clothing item, serialized as JSON.
    Item,
}

/// Well-known signal payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Start,
    End,
    ToolEnd,
    LlmEnd,
    Stop,
}

impl Signal {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Start => "START",
            Signal::End => "END",
            Signal::ToolEnd => "TOOL_END",
            Signal::LlmEnd => "LLM_END",
            Signal::Stop => "STOP",
        }
    }
}

/// One event on the run's streaming channel.
///
/// Events serialize to a single JSON object; the service boundary emits one
/// object per line.
///
/// # Examples
///
/// ```rust
/// use modiste::streaming::{EventKind, Signal, StreamEvent};
///
/// let ev = StreamEvent::token("burgundy");
/// assert_eq!(ev.kind, EventKind::Token);
///
/// let end = StreamEvent::signal(Signal::End);
/// assert!(end.is_signal(Signal::End));
///
/// let line = end.to_json_string().unwrap();
/// assert!(line.contains("\"payload\":\"END\""));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub payload: String,
    #[serde(default)]
    pub attributes: FxHashMap<String, Value>,
}

impl StreamEvent {
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
            attributes: FxHashMap::default(),
        }
    }

    /// A control-flow signal.
    pub fn signal(signal: Signal) -> Self {
        Self::new(EventKind::Signal, signal.as_str())
    }

    /// One chunk of generated text.
    pub fn token(text: impl Into<String>) -> Self {
        Self::new(EventKind::Token, text)
    }

    /// Start-of-call marker for a tool or subgraph.
    pub fn action(tool: &str) -> Self {
        Self::new(EventKind::Action, tool).with_attr("tool", Value::String(tool.to_string()))
    }

    /// Terminal tool failure carrying the user-facing message.
    pub fn action_error(tool: &str, user_message: impl Into<String>) -> Self {
        Self::new(EventKind::Action, user_message)
            .with_attr("tool", Value::String(tool.to_string()))
            .with_attr("error", Value::Bool(true))
    }

    /// Informational payload with attributes.
    pub fn metadata(payload: impl Into<String>) -> Self {
        Self::new(EventKind::Metadata, payload)
    }

    /// One extracted clothing item, serialized into the payload.
    pub fn item(item: &ClothingItem) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventKind::Item, serde_json::to_string(item)?))
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// True when this is the given control-flow signal.
    #[must_use]
    pub fn is_signal(&self, signal: Signal) -> bool {
        self.kind == EventKind::Signal && self.payload == signal.as_str()
    }

    /// True when this event marks a terminal tool failure.
    #[must_use]
    pub fn is_action_error(&self) -> bool {
        self.kind == EventKind::Action
            && self.attributes.get("error") == Some(&Value::Bool(true))
    }

    /// Structured JSON form, stamped with the serialization time.
    pub fn to_json_value(&self) -> Value {
        serde_json::json!({
            "kind": self.kind,
            "payload": self.payload,
            "attributes": self.attributes,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    /// Compact single-line JSON encoding for the wire.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_constructors_roundtrip() {
        let ev = StreamEvent::signal(Signal::ToolEnd);
        assert!(ev.is_signal(Signal::ToolEnd));
        assert!(!ev.is_signal(Signal::End));
    }

    #[test]
    fn action_error_is_flagged() {
        let ev = StreamEvent::action_error("web_search", "sorry");
        assert!(ev.is_action_error());
        assert_eq!(ev.attributes["tool"], Value::String("web_search".into()));

        let plain = StreamEvent::action("web_search");
        assert!(!plain.is_action_error());
    }

    #[test]
    fn json_line_has_kind_and_payload() {
        let line = StreamEvent::token("hi").to_json_string().unwrap();
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["kind"], "token");
        assert_eq!(v["payload"], "hi");
        assert!(v["timestamp"].is_string());
    }
}

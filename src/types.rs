//! Core identifier types for the agent graph.
//!
//! [`NodeKind`] names the nodes of a workflow graph, with virtual `Start`
//! and `End` endpoints that are never executed. [`ChannelType`] names the
//! state channels that reducers are registered against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within the agent graph.
///
/// `Start` and `End` are virtual endpoints: they carry no executor and exist
/// only to anchor the graph topology. Every executable node is a
/// `Custom(name)` entry.
///
/// # Examples
///
/// ```rust
/// use modiste::types::NodeKind;
///
/// let retrieve = NodeKind::Custom("retrieve".to_string());
/// assert!(retrieve.is_custom());
/// assert!(NodeKind::Start.is_start());
/// assert_eq!(NodeKind::from("End"), NodeKind::End);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Entry point for graph execution; has no incoming edges.
    Start,
    /// Terminal endpoint; reaching it ends the run.
    End,
    /// An executable node identified by a unique name.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the virtual [`Start`](Self::Start) endpoint.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the virtual [`End`](Self::End) endpoint.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is an executable custom node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

// Allow string literals wherever a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

/// Identifies a state channel of [`AgentState`](crate::state::AgentState).
///
/// Each channel carries one kind of conversation data and has its own
/// reducer registered in the
/// [`ReducerRegistry`](crate::reducers::ReducerRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Conversation messages; append-only.
    Message,
    /// The user's question for the current turn; last write wins.
    Question,
    /// The subgraph selected by the router; last write wins.
    Route,
    /// The derived clothing search query; field-wise merge.
    SearchItem,
    /// Raw web-search hits; append-only.
    SearchResults,
    /// Structured clothing items extracted from search hits; append-only.
    ParsedResults,
    /// Search attempt counter; additive accumulator.
    SearchRetries,
    /// Retrieved documents for the RAG pipeline; replaced on update.
    Docs,
    /// The streamed answer text; concatenated.
    Answer,
    /// Free-form metadata map; shallow merge.
    Extra,
    /// Recoverable error events; append-only.
    Error,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Message => "messages",
            Self::Question => "user_question",
            Self::Route => "selected_subgraph",
            Self::SearchItem => "search_item",
            Self::SearchResults => "search_results",
            Self::ParsedResults => "parsed_results",
            Self::SearchRetries => "search_retries",
            Self::Docs => "docs",
            Self::Answer => "answer",
            Self::Extra => "extra",
            Self::Error => "errors",
        };
        write!(f, "{label}")
    }
}

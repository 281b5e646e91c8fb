//! Node execution primitives.
//!
//! A [`Node`] is one async unit of work in the agent graph: it receives the
//! current [`StateSnapshot`] plus a run-scoped [`NodeContext`] and returns a
//! sparse [`NodePartial`]. Nodes never mutate state directly and never see
//! another node's internals except through state.
//!
//! # Error Handling
//!
//! - **Fatal errors**: return `Err(NodeError)` to end the run (the driver
//!   still emits the completion signal).
//! - **Recoverable errors**: record them in `NodePartial::errors` and return
//!   `Ok`; the run continues.
//!
//! [`NodeError::is_retryable`] carries the retryable-vs-fatal classification
//! that the action node's retry loop branches on.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::channels::errors::ErrorEvent;
use crate::message::Message;
use crate::providers::LlmError;
use crate::router::RouterError;
use crate::runtimes::AgentConfig;
use crate::schemas::{ClothingItem, Document, SearchHit, SearchQuery};
use crate::state::StateSnapshot;
use crate::streaming::{StreamEvent, StreamSender};

/// One executable unit of the agent graph.
///
/// # Examples
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use modiste::message::Message;
/// use modiste::node::{Node, NodeContext, NodeError, NodePartial};
/// use modiste::state::StateSnapshot;
///
/// struct EchoNode;
///
/// #[async_trait]
/// impl Node for EchoNode {
///     async fn run(
///         &self,
///         snapshot: StateSnapshot,
///         _ctx: NodeContext,
///     ) -> Result<NodePartial, NodeError> {
///         let reply = Message::assistant(&snapshot.user_question);
///         Ok(NodePartial::new().with_messages(vec![reply]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against the given snapshot.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;
}

/// Run-scoped context handed to each node invocation.
#[derive(Clone)]
pub struct NodeContext {
    /// Name of the executing node.
    pub node_id: String,
    /// Execution step number within the run (1-based).
    pub step: u64,
    /// Producer handle of the run's streaming channel.
    pub stream: StreamSender,
    /// Effective configuration for this run.
    pub config: Arc<AgentConfig>,
}

impl NodeContext {
    /// Push an event onto the run's streaming channel, waiting if the
    /// bounded buffer is full.
    pub async fn emit(&self, event: StreamEvent) -> Result<(), NodeError> {
        self.stream
            .push(event)
            .await
            .map_err(|_| NodeError::StreamClosed)
    }
}

/// Sparse state update returned by a node.
///
/// Every field is optional; the engine merges populated fields through the
/// channel's registered reducer and leaves the rest untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePartial {
    pub messages: Option<Vec<Message>>,
    pub user_question: Option<String>,
    pub selected_subgraph: Option<String>,
    pub search_item: Option<SearchQuery>,
    pub search_results: Option<Vec<SearchHit>>,
    pub parsed_results: Option<Vec<ClothingItem>>,
    /// Added to the retry counter, not stored verbatim.
    pub search_retries: Option<u32>,
    pub docs: Option<Vec<Document>>,
    /// Concatenated onto the accumulated answer.
    pub answer: Option<String>,
    pub extra: Option<FxHashMap<String, serde_json::Value>>,
    pub errors: Option<Vec<ErrorEvent>>,
}

impl NodePartial {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_selected_subgraph(mut self, name: impl Into<String>) -> Self {
        self.selected_subgraph = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_search_item(mut self, item: SearchQuery) -> Self {
        self.search_item = Some(item);
        self
    }

    #[must_use]
    pub fn with_search_results(mut self, hits: Vec<SearchHit>) -> Self {
        self.search_results = Some(hits);
        self
    }

    #[must_use]
    pub fn with_parsed_results(mut self, items: Vec<ClothingItem>) -> Self {
        self.parsed_results = Some(items);
        self
    }

    #[must_use]
    pub fn with_search_retries(mut self, delta: u32) -> Self {
        self.search_retries = Some(delta);
        self
    }

    #[must_use]
    pub fn with_docs(mut self, docs: Vec<Document>) -> Self {
        self.docs = Some(docs);
        self
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, serde_json::Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Fatal node failures.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(modiste::node::missing_input),
        help("Check that an earlier node produced the required state field.")
    )]
    MissingInput { what: &'static str },

    /// Language-model call failed.
    #[error(transparent)]
    #[diagnostic(code(modiste::node::llm))]
    Llm(#[from] LlmError),

    /// External provider or capability failure.
    #[error("provider error ({capability}): {message}")]
    #[diagnostic(code(modiste::node::provider))]
    Provider {
        capability: &'static str,
        message: String,
    },

    /// An external capability returned a response whose shape violates its
    /// contract; retrying cannot help.
    #[error("contract violation from {capability}: {detail}")]
    #[diagnostic(
        code(modiste::node::contract),
        help("The response shape will not change on retry; fix the integration.")
    )]
    ContractViolation {
        capability: &'static str,
        detail: String,
    },

    /// Subgraph routing failed for the turn.
    #[error(transparent)]
    #[diagnostic(code(modiste::node::routing))]
    Routing(#[from] RouterError),

    /// JSON (de)serialization failure.
    #[error(transparent)]
    #[diagnostic(code(modiste::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// The run's streaming channel is gone (consumer dropped).
    #[error("streaming channel closed")]
    #[diagnostic(code(modiste::node::stream_closed))]
    StreamClosed,
}

impl NodeError {
    /// Whether retrying the same operation with unchanged inputs may
    /// succeed. Transient model/provider failures are retryable; contract
    /// violations, routing failures, and local errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            NodeError::Llm(err) => err.is_retryable(),
            NodeError::Provider { .. } => true,
            NodeError::Routing(RouterError::Llm(err)) => err.is_retryable(),
            _ => false,
        }
    }
}

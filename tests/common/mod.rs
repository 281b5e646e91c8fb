//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use modiste::node::{Node, NodeContext, NodeError, NodePartial};
use modiste::runtimes::{AgentConfig, Collaborators};
use modiste::state::StateSnapshot;
use modiste::streaming::{self, EventDrain, Signal, StreamEvent};
use modiste::utils::testing::{ScriptedChatModel, StaticFetcher, StaticRetriever, StaticSearch};

pub fn init() {
    modiste::telemetry::init_tracing();
}

/// Fast test configuration: short polls and deadlines.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        poll_interval: Duration::from_millis(100),
        fetch_timeout: Duration::from_millis(200),
        ..AgentConfig::default()
    }
}

/// A node context wired to a fresh streaming channel.
pub fn test_ctx(node_id: &str) -> (NodeContext, EventDrain) {
    let config = Arc::new(test_config());
    let (stream, drain) = streaming::bounded(config.channel_capacity, config.poll_interval);
    let ctx = NodeContext {
        node_id: node_id.to_string(),
        step: 1,
        stream,
        config,
    };
    (ctx, drain)
}

/// Collaborators over a scripted model, three retrievable documents, and a
/// single clothing search hit.
pub fn collaborators(model: ScriptedChatModel) -> Collaborators {
    Collaborators {
        model: Arc::new(model),
        retriever: Arc::new(StaticRetriever::new(vec![
            modiste::schemas::Document::new("Fall palettes favor burgundy this year."),
            modiste::schemas::Document::new("Moss green dominated the runway shows."),
            modiste::schemas::Document::new("Chocolate brown pairs with both."),
        ])),
        search: Arc::new(StaticSearch::new(json!([
            {"url": "https://shop.example/a", "content": "A lovely red wool dress for $120."}
        ]))),
        fetcher: Arc::new(StaticFetcher::new("A lovely red wool dress for $120.")),
    }
}

/// Drain every event until the stream closes.
pub async fn drain_all(drain: &mut EventDrain) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = drain.next().await {
        events.push(event);
    }
    events
}

pub fn assert_single_trailing_end(events: &[StreamEvent]) {
    let end_count = events
        .iter()
        .filter(|e| e.is_signal(Signal::End))
        .count();
    assert_eq!(end_count, 1, "expected exactly one completion signal");
    assert!(
        events.last().expect("stream had events").is_signal(Signal::End),
        "completion signal must be the final event"
    );
}

/// Node that returns an empty partial.
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::default())
    }
}

/// Node that bumps the retry counter each visit, for cycle tests.
pub struct CountingNode;

#[async_trait]
impl Node for CountingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_search_retries(1))
    }
}

/// Node that always fails with a missing-input error.
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::MissingInput { what: "test_key" })
    }
}

//! The compiled graph engine.
//!
//! [`App`] owns the node registry and edge tables produced by
//! [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile) and
//! executes runs with an iterative dispatch loop keyed by the current
//! [`NodeKind`]: no recursion, so retry cycles cost constant stack. One
//! compiled `App` is immutable and shared across concurrent runs; all
//! per-run data lives in the [`AgentState`] and [`RunContext`] passed in.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use crate::channels::Channel;
use crate::channels::errors::{CauseChain, ErrorEvent};
use crate::graphs::ConditionalEdge;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::runtimes::AgentConfig;
use crate::state::{AgentState, StateSnapshot};
use crate::streaming::StreamSender;
use crate::types::NodeKind;

/// Per-run context threaded into every node invocation.
#[derive(Clone)]
pub struct RunContext {
    /// Producer side of the run's streaming channel.
    pub stream: StreamSender,
    /// Effective configuration for this run.
    pub config: Arc<AgentConfig>,
}

/// Fatal engine failures. Any of these end the run; the driver still emits
/// the completion signal so the consumer's stream terminates cleanly.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("node {node} failed at step {step}")]
    #[diagnostic(code(modiste::engine::node_failed))]
    NodeFailed {
        node: String,
        step: u64,
        #[source]
        source: NodeError,
    },

    #[error("no node registered for {node}")]
    #[diagnostic(code(modiste::engine::unknown_node))]
    UnknownNode { node: String },

    #[error("node {node} resolved no next node")]
    #[diagnostic(code(modiste::engine::dead_end))]
    DeadEnd { node: String },

    #[error("conditional edge from {node} produced unmapped branch {branch:?}")]
    #[diagnostic(
        code(modiste::engine::unknown_branch),
        help("Every value the predicate can return must appear in the branch table.")
    )]
    UnknownBranch { node: String, branch: String },

    #[error(transparent)]
    #[diagnostic(code(modiste::engine::reducer))]
    Reducer(#[from] ReducerError),

    #[error("run exceeded {limit} steps")]
    #[diagnostic(
        code(modiste::engine::step_limit),
        help("A cycle is not converging; check the retry ceiling predicates.")
    )]
    StepLimit { limit: u64 },
}

impl EngineError {
    /// True when the failure originated in subgraph routing.
    #[must_use]
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self,
            EngineError::NodeFailed {
                source: NodeError::Routing(_),
                ..
            } | EngineError::UnknownBranch { .. }
        )
    }
}

/// Executable agent graph.
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, NodeKind>,
    conditional_edges: FxHashMap<NodeKind, ConditionalEdge>,
    reducer_registry: ReducerRegistry,
}

impl App {
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, NodeKind>,
        conditional_edges: FxHashMap<NodeKind, ConditionalEdge>,
    ) -> Self {
        App {
            nodes,
            edges,
            conditional_edges,
            reducer_registry: ReducerRegistry::default(),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, NodeKind> {
        &self.edges
    }

    #[must_use]
    pub fn conditional_edges(&self) -> &FxHashMap<NodeKind, ConditionalEdge> {
        &self.conditional_edges
    }

    /// Execute the graph to completion for one turn.
    ///
    /// Starting from the virtual `Start`, each iteration executes the
    /// current node, merges its partial update through the reducers, and
    /// resolves the next node from the edge tables. Reaching `End` returns
    /// the accumulated state.
    #[instrument(skip(self, state, ctx), err)]
    pub async fn invoke(
        &self,
        mut state: AgentState,
        ctx: RunContext,
    ) -> Result<AgentState, EngineError> {
        let mut current = self.next_node(&NodeKind::Start, &state.snapshot())?;
        let mut step: u64 = 0;

        while current != NodeKind::End {
            step += 1;
            if step > ctx.config.max_steps {
                return Err(EngineError::StepLimit {
                    limit: ctx.config.max_steps,
                });
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| EngineError::UnknownNode {
                    node: current.to_string(),
                })?;

            let node_ctx = NodeContext {
                node_id: current.to_string(),
                step,
                stream: ctx.stream.clone(),
                config: Arc::clone(&ctx.config),
            };

            tracing::debug!(node = %current, step, "executing node");
            match node.run(state.snapshot(), node_ctx).await {
                Ok(partial) => {
                    let updated = self.apply_update(&mut state, partial)?;
                    tracing::debug!(node = %current, step, updated_channels = ?updated, "node applied");
                }
                Err(err) => {
                    let event = ErrorEvent::node(
                        current.to_string(),
                        step,
                        CauseChain::msg(err.to_string()),
                    )
                    .with_tag(if err.is_retryable() { "retryable" } else { "fatal" });
                    let _ = self
                        .reducer_registry
                        .apply_all(&mut state, &NodePartial::new().with_errors(vec![event]));
                    return Err(EngineError::NodeFailed {
                        node: current.to_string(),
                        step,
                        source: err,
                    });
                }
            }

            current = self.next_node(&current, &state.snapshot())?;
        }

        tracing::debug!(steps = step, "run reached End");
        Ok(state)
    }

    /// Resolve the node that follows `from` given the current state.
    fn next_node(&self, from: &NodeKind, snapshot: &StateSnapshot) -> Result<NodeKind, EngineError> {
        if let Some(to) = self.edges.get(from) {
            return Ok(to.clone());
        }
        if let Some(edge) = self.conditional_edges.get(from) {
            let (branch, target) = edge.evaluate(snapshot);
            return match target {
                Some(to) => {
                    tracing::debug!(node = %from, branch = %branch, target = %to, "conditional edge routed");
                    Ok(to.clone())
                }
                None => Err(EngineError::UnknownBranch {
                    node: from.to_string(),
                    branch,
                }),
            };
        }
        Err(EngineError::DeadEnd {
            node: from.to_string(),
        })
    }

    /// Merge one node's partial update through the reducers and bump the
    /// version of each channel whose content changed.
    pub fn apply_update(
        &self,
        state: &mut AgentState,
        partial: NodePartial,
    ) -> Result<Vec<&'static str>, EngineError> {
        let messages_before = state.messages.get().len();
        let question_before = partial
            .user_question
            .is_some()
            .then(|| state.user_question.snapshot());
        let route_before = partial
            .selected_subgraph
            .is_some()
            .then(|| state.selected_subgraph.snapshot());
        let item_before = partial
            .search_item
            .is_some()
            .then(|| state.search_item.snapshot());
        let hits_before = state.search_results.get().len();
        let parsed_before = state.parsed_results.get().len();
        let retries_before = state.search_retries.snapshot();
        let docs_before = partial.docs.is_some().then(|| state.docs.snapshot());
        let answer_before = state.answer.get().len();
        let extra_before = partial.extra.is_some().then(|| state.extra.snapshot());
        let errors_before = state.errors.get().len();

        self.reducer_registry.apply_all(state, &partial)?;

        let mut updated: Vec<&'static str> = Vec::new();

        if state.messages.get().len() != messages_before {
            bump(&mut state.messages);
            updated.push("messages");
        }
        if let Some(before) = question_before
            && *state.user_question.get() != before
        {
            bump(&mut state.user_question);
            updated.push("user_question");
        }
        if let Some(before) = route_before
            && *state.selected_subgraph.get() != before
        {
            bump(&mut state.selected_subgraph);
            updated.push("selected_subgraph");
        }
        if let Some(before) = item_before
            && *state.search_item.get() != before
        {
            bump(&mut state.search_item);
            updated.push("search_item");
        }
        if state.search_results.get().len() != hits_before {
            bump(&mut state.search_results);
            updated.push("search_results");
        }
        if state.parsed_results.get().len() != parsed_before {
            bump(&mut state.parsed_results);
            updated.push("parsed_results");
        }
        if *state.search_retries.get() != retries_before {
            bump(&mut state.search_retries);
            updated.push("search_retries");
        }
        if let Some(before) = docs_before
            && *state.docs.get() != before
        {
            bump(&mut state.docs);
            updated.push("docs");
        }
        if state.answer.get().len() != answer_before {
            bump(&mut state.answer);
            updated.push("answer");
        }
        if let Some(before) = extra_before
            && *state.extra.get() != before
        {
            bump(&mut state.extra);
            updated.push("extra");
        }
        if state.errors.get().len() != errors_before {
            bump(&mut state.errors);
            updated.push("errors");
        }

        Ok(updated)
    }
}

fn bump<C: Channel>(channel: &mut C) {
    let version = channel.version();
    channel.set_version(version.saturating_add(1));
}

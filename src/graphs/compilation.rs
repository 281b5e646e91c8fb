//! Structural validation and compilation into an executable [`App`].

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use thiserror::Error;

use super::edges::ConditionalEdge;
use crate::app::App;
use crate::node::Node;
use crate::types::NodeKind;

/// Errors surfaced by [`GraphBuilder::compile`](super::GraphBuilder::compile).
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("duplicate node registration: {node}")]
    #[diagnostic(code(modiste::graphs::duplicate_node))]
    DuplicateNode { node: String },

    #[error("no entry edge from Start")]
    #[diagnostic(
        code(modiste::graphs::missing_entry),
        help("Add an edge or conditional edge from NodeKind::Start.")
    )]
    MissingEntry,

    #[error("node {node} has more than one unconditional edge")]
    #[diagnostic(
        code(modiste::graphs::duplicate_edge),
        help("Each node resolves to exactly one next node; use a conditional edge to branch.")
    )]
    DuplicateEdge { node: String },

    #[error("node {node} has both an unconditional and a conditional edge")]
    #[diagnostic(code(modiste::graphs::conflicting_edges))]
    ConflictingEdges { node: String },

    #[error("edge from {from} targets unknown node {to}")]
    #[diagnostic(code(modiste::graphs::unknown_target))]
    UnknownTarget { from: String, to: String },

    #[error("conditional edge from {from} maps branch {branch:?} to unknown node {to}")]
    #[diagnostic(code(modiste::graphs::unknown_branch_target))]
    UnknownBranchTarget {
        from: String,
        branch: String,
        to: String,
    },

    #[error("node {node} has no outgoing edge")]
    #[diagnostic(
        code(modiste::graphs::dead_end),
        help("Every executable node must route somewhere, if only to End.")
    )]
    DeadEnd { node: String },
}

impl super::builder::GraphBuilder {
    /// Validate the graph and compile it into an executable [`App`].
    pub fn compile(self) -> Result<App, GraphCompileError> {
        let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
        for (id, node) in self.nodes {
            if nodes.insert(id.clone(), node).is_some() {
                return Err(GraphCompileError::DuplicateNode {
                    node: id.to_string(),
                });
            }
        }

        let known = |kind: &NodeKind| kind.is_end() || nodes.contains_key(kind);

        let mut edges: FxHashMap<NodeKind, NodeKind> = FxHashMap::default();
        for (from, to) in self.edges {
            if !known(&to) {
                return Err(GraphCompileError::UnknownTarget {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            if edges.insert(from.clone(), to).is_some() {
                return Err(GraphCompileError::DuplicateEdge {
                    node: from.to_string(),
                });
            }
        }

        let mut conditional_edges: FxHashMap<NodeKind, ConditionalEdge> = FxHashMap::default();
        for edge in self.conditional_edges {
            let from = edge.from().clone();
            if edges.contains_key(&from) {
                return Err(GraphCompileError::ConflictingEdges {
                    node: from.to_string(),
                });
            }
            for (branch, to) in edge.branches() {
                if !known(to) {
                    return Err(GraphCompileError::UnknownBranchTarget {
                        from: from.to_string(),
                        branch: branch.clone(),
                        to: to.to_string(),
                    });
                }
            }
            if conditional_edges.insert(from.clone(), edge).is_some() {
                return Err(GraphCompileError::DuplicateEdge {
                    node: from.to_string(),
                });
            }
        }

        let mut routed: FxHashSet<&NodeKind> = FxHashSet::default();
        routed.extend(edges.keys());
        routed.extend(conditional_edges.keys());

        if !routed.contains(&NodeKind::Start) {
            return Err(GraphCompileError::MissingEntry);
        }
        for id in nodes.keys() {
            if !routed.contains(id) {
                return Err(GraphCompileError::DeadEnd {
                    node: id.to_string(),
                });
            }
        }

        Ok(App::from_parts(nodes, edges, conditional_edges))
    }
}

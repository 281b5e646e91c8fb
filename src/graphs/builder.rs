//! Fluent construction of agent graphs.

use std::sync::Arc;

use super::edges::{BranchPredicate, ConditionalEdge};
use crate::node::Node;
use crate::types::NodeKind;

/// Builder for agent graphs.
///
/// Collects nodes and edges, then [`compile`](Self::compile)s into an
/// executable [`App`](crate::app::App). Structural rules:
///
/// - exactly one edge (unconditional *or* conditional) leaves each
///   executable node and the virtual `Start`;
/// - every edge target is a registered node or `End`;
/// - `Start`/`End` are virtual and cannot be registered as nodes.
///
/// Cycles are legal; the engine executes them iteratively.
///
/// # Examples
///
/// ```rust
/// use modiste::graphs::GraphBuilder;
/// use modiste::types::NodeKind;
///
/// # struct NoopNode;
/// # #[async_trait::async_trait]
/// # impl modiste::node::Node for NoopNode {
/// #     async fn run(
/// #         &self,
/// #         _: modiste::state::StateSnapshot,
/// #         _: modiste::node::NodeContext,
/// #     ) -> Result<modiste::node::NodePartial, modiste::node::NodeError> {
/// #         Ok(modiste::node::NodePartial::default())
/// #     }
/// # }
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("answer".into()), NoopNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("answer".into()))
///     .add_edge(NodeKind::Custom("answer".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// assert_eq!(app.nodes().len(), 1);
/// ```
pub struct GraphBuilder {
    pub(super) nodes: Vec<(NodeKind, Arc<dyn Node>)>,
    pub(super) edges: Vec<(NodeKind, NodeKind)>,
    pub(super) conditional_edges: Vec<ConditionalEdge>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            conditional_edges: Vec::new(),
        }
    }

    /// Register an executable node.
    ///
    /// Attempts to register the virtual `Start`/`End` endpoints are ignored
    /// with a warning.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(?id, "ignoring registration of virtual node kind");
            }
            _ => {
                self.nodes.push((id, Arc::new(node)));
            }
        }
        self
    }

    /// Add an unconditional edge.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.push((from, to));
        self
    }

    /// Add a conditional edge: the predicate picks a branch value that the
    /// table maps to the next node.
    #[must_use]
    pub fn add_conditional_edge(
        mut self,
        from: NodeKind,
        predicate: BranchPredicate,
        branches: impl IntoIterator<Item = (String, NodeKind)>,
    ) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, predicate, branches));
        self
    }
}

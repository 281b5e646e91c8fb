//! The router node: selects the subgraph for the turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::graphs::BranchPredicate;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::providers::ChatModel;
use crate::router;
use crate::state::StateSnapshot;
use crate::streaming::StreamEvent;
use crate::subgraph::SubgraphRegistry;

/// Runs the router once and records the chosen subgraph in state.
///
/// The conditional edge out of this node maps each registered subgraph name
/// to its entry node, so the selection drives the next transition. Routing
/// failure propagates as a fatal [`NodeError::Routing`].
pub struct SelectSubgraphNode {
    model: Arc<dyn ChatModel>,
    registry: Arc<SubgraphRegistry>,
}

impl SelectSubgraphNode {
    pub fn new(model: Arc<dyn ChatModel>, registry: Arc<SubgraphRegistry>) -> Self {
        Self { model, registry }
    }
}

#[async_trait]
impl Node for SelectSubgraphNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        if snapshot.user_question.is_empty() {
            return Err(NodeError::MissingInput {
                what: "user_question",
            });
        }

        let subgraph =
            router::select(self.model.as_ref(), &snapshot.user_question, &self.registry).await?;

        ctx.emit(
            StreamEvent::action(&subgraph.name)
                .with_attr("router", Value::Bool(true)),
        )
        .await?;

        Ok(NodePartial::new().with_selected_subgraph(subgraph.name.clone()))
    }
}

/// Conditional-edge predicate reading the router's selection. The branch
/// table maps each subgraph name to its entry node; an empty selection
/// cannot occur here because routing failure already ended the run.
pub fn route_branch() -> BranchPredicate {
    Arc::new(|snapshot| snapshot.selected_subgraph.clone().unwrap_or_default())
}

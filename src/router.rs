//! Subgraph selection.
//!
//! The router runs at most once per turn: it sends one classification
//! prompt listing every registered subgraph and scans the free-text reply
//! for the first literal occurrence of a registered name, in registration
//! order. A reply naming no subgraph is a fatal routing failure; the run
//! must not fall back to an arbitrary pipeline.

use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::providers::{ChatModel, LlmError};
use crate::subgraph::{Subgraph, SubgraphRegistry};

#[derive(Debug, Error, Diagnostic)]
pub enum RouterError {
    /// The model's reply contained no registered subgraph name. Fatal for
    /// the turn and never retried.
    #[error("model response named no registered subgraph")]
    #[diagnostic(
        code(modiste::router::no_match),
        help("The routing prompt may need adjustment for this model.")
    )]
    NoMatch { response: String },

    /// The classification call itself failed (retryable when transient).
    #[error(transparent)]
    #[diagnostic(code(modiste::router::llm))]
    Llm(#[from] LlmError),

    /// No subgraphs are registered; the service is misconfigured.
    #[error("no subgraphs registered")]
    #[diagnostic(code(modiste::router::empty_registry))]
    EmptyRegistry,
}

/// Build the classification prompt for `question` over the registry.
fn routing_prompt(question: &str, registry: &SubgraphRegistry) -> String {
    let mut prompt = String::from(
        "You are the router for a fashion assistant. Pick the single pipeline \
         best suited to answer the user's question and reply with its name.\n\n\
         Pipelines:\n",
    );
    for subgraph in registry.iter() {
        prompt.push_str(&format!("- {}: {}\n", subgraph.name, subgraph.description));
    }
    prompt.push_str(&format!("\nUser question: {question}\n\nPipeline name:"));
    prompt
}

/// Choose the subgraph that handles `question`.
///
/// Scans the raw model reply for the first literal occurrence of any
/// registered name, in registration order; first match wins.
#[instrument(skip(model, registry), err)]
pub async fn select<'a>(
    model: &dyn ChatModel,
    question: &str,
    registry: &'a SubgraphRegistry,
) -> Result<&'a Subgraph, RouterError> {
    if registry.is_empty() {
        return Err(RouterError::EmptyRegistry);
    }

    let prompt = routing_prompt(question, registry);
    let response = model
        .invoke(&[crate::message::Message::user(&prompt)])
        .await?;

    match registry.iter().find(|s| response.contains(&s.name)) {
        Some(subgraph) => {
            tracing::info!(subgraph = %subgraph.name, "router selected subgraph");
            Ok(subgraph)
        }
        None => {
            tracing::warn!(%response, "router response matched no subgraph");
            Err(RouterError::NoMatch { response })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_subgraph_in_order() {
        let registry = SubgraphRegistry::new()
            .register(Subgraph::new("rag_graph", "handles trends", "retrieve"))
            .register(Subgraph::new("qa_graph", "handles basics", "qa"));
        let prompt = routing_prompt("what's in this fall?", &registry);
        let rag_at = prompt.find("rag_graph: handles trends").unwrap();
        let qa_at = prompt.find("qa_graph: handles basics").unwrap();
        assert!(rag_at < qa_at);
        assert!(prompt.contains("what's in this fall?"));
    }
}

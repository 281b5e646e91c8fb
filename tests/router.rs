mod common;

use modiste::router::{self, RouterError};
use modiste::subgraph::{Subgraph, SubgraphRegistry};
use modiste::utils::testing::{FailingChatModel, ScriptedChatModel};

fn two_subgraphs() -> SubgraphRegistry {
    SubgraphRegistry::new()
        .register(Subgraph::new("A", "handles X", "entry_a"))
        .register(Subgraph::new("B", "handles Y", "entry_b"))
}

#[tokio::test]
async fn selects_the_named_subgraph() {
    common::init();
    let model = ScriptedChatModel::new(["I would pick B for this."]);
    let registry = two_subgraphs();

    let selected = router::select(&model, "question about Y", &registry)
        .await
        .unwrap();
    assert_eq!(selected.name, "B");
    assert_eq!(selected.entry, "entry_b".into());
}

#[tokio::test]
async fn first_registered_name_wins_when_both_appear() {
    common::init();
    let model = ScriptedChatModel::new(["Either A or B would work."]);
    let registry = two_subgraphs();

    let selected = router::select(&model, "ambiguous", &registry).await.unwrap();
    assert_eq!(selected.name, "A");
}

#[tokio::test]
async fn unknown_response_is_a_fatal_routing_failure() {
    common::init();
    let model = ScriptedChatModel::new(["No idea, sorry."]);
    let registry = two_subgraphs();

    let err = router::select(&model, "question", &registry).await.err().unwrap();
    match err {
        RouterError::NoMatch { response } => assert!(response.contains("No idea")),
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[tokio::test]
async fn model_failure_propagates_as_retryable_llm_error() {
    common::init();
    let model = FailingChatModel::new();
    let registry = two_subgraphs();

    let err = router::select(&model, "question", &registry).await.err().unwrap();
    match err {
        RouterError::Llm(inner) => assert!(inner.is_retryable()),
        other => panic!("expected Llm, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_registry_is_rejected() {
    common::init();
    let model = ScriptedChatModel::new(["anything"]);
    let registry = SubgraphRegistry::new();

    let err = router::select(&model, "question", &registry).await.err().unwrap();
    assert!(matches!(err, RouterError::EmptyRegistry));
}

#[tokio::test]
async fn prompt_contains_names_and_descriptions() {
    common::init();
    let model = ScriptedChatModel::new(["A"]);
    let registry = two_subgraphs();
    router::select(&model, "the question text", &registry)
        .await
        .unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("A: handles X"));
    assert!(prompts[0].contains("B: handles Y"));
    assert!(prompts[0].contains("the question text"));
}

mod common;

use proptest::prelude::*;
use serde_json::json;

use modiste::channels::Channel;
use modiste::graphs::GraphBuilder;
use modiste::message::Message;
use modiste::node::NodePartial;
use modiste::reducers::ReducerRegistry;
use modiste::schemas::SearchQuery;
use modiste::state::AgentState;
use modiste::types::NodeKind;

use common::NoopNode;

fn apply(state: &mut AgentState, partial: NodePartial) {
    ReducerRegistry::default()
        .apply_all(state, &partial)
        .expect("default registry covers every channel");
}

#[test]
fn messages_append_in_order() {
    let mut state = AgentState::new_with_user_message("q");
    apply(
        &mut state,
        NodePartial::new().with_messages(vec![Message::assistant("a"), Message::tool("b")]),
    );
    apply(
        &mut state,
        NodePartial::new().with_messages(vec![Message::assistant("c")]),
    );

    let contents: Vec<_> = state
        .messages
        .snapshot()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["q", "a", "b", "c"]);
}

proptest! {
    /// Append-only invariant: for any sequence of partial updates, the
    /// merged messages equal the ordered concatenation of all updates.
    #[test]
    fn messages_equal_ordered_concatenation(
        updates in prop::collection::vec(
            prop::collection::vec("[a-z]{1,8}", 0..4),
            0..6,
        )
    ) {
        let mut state = AgentState::new_with_conversation(Vec::new());
        let mut expected = Vec::new();

        for update in &updates {
            let batch: Vec<Message> =
                update.iter().map(|c| Message::assistant(c)).collect();
            expected.extend(update.iter().cloned());
            apply(&mut state, NodePartial::new().with_messages(batch));
        }

        let merged: Vec<String> = state
            .messages
            .snapshot()
            .into_iter()
            .map(|m| m.content)
            .collect();
        prop_assert_eq!(merged, expected);
    }
}

#[test]
fn question_and_route_are_last_write_wins() {
    let mut state = AgentState::new_with_user_message("original");
    apply(
        &mut state,
        NodePartial {
            user_question: Some("rewritten".into()),
            selected_subgraph: Some("rag_graph".into()),
            ..Default::default()
        },
    );
    apply(
        &mut state,
        NodePartial {
            selected_subgraph: Some("qa_graph".into()),
            ..Default::default()
        },
    );

    assert_eq!(state.user_question.snapshot(), "rewritten");
    assert_eq!(state.selected_subgraph.snapshot().as_deref(), Some("qa_graph"));
}

#[test]
fn search_item_merges_field_wise() {
    let mut state = AgentState::default();
    apply(
        &mut state,
        NodePartial::new().with_search_item(SearchQuery::new("red dress")),
    );
    apply(
        &mut state,
        NodePartial::new().with_search_item(SearchQuery {
            query: String::new(),
            category: Some("dresses".into()),
            color: Some("red".into()),
        }),
    );

    let merged = state.search_item.snapshot().expect("item present");
    assert_eq!(merged.query, "red dress");
    assert_eq!(merged.category.as_deref(), Some("dresses"));
    assert_eq!(merged.color.as_deref(), Some("red"));
}

#[test]
fn retries_accumulate_additively() {
    let mut state = AgentState::default();
    for _ in 0..3 {
        apply(&mut state, NodePartial::new().with_search_retries(1));
    }
    assert_eq!(state.search_retries.snapshot(), 3);
}

#[test]
fn answer_concatenates_chunks() {
    let mut state = AgentState::default();
    apply(&mut state, NodePartial::new().with_answer("Burgundy "));
    apply(&mut state, NodePartial::new().with_answer("and moss green."));
    assert_eq!(state.answer.snapshot(), "Burgundy and moss green.");
}

#[test]
fn extra_merges_shallowly() {
    let mut state = AgentState::default();
    let mut first = modiste::utils::collections::new_attr_map();
    first.insert("a".into(), json!(1));
    first.insert("b".into(), json!(2));
    apply(&mut state, NodePartial::new().with_extra(first));

    let mut second = modiste::utils::collections::new_attr_map();
    second.insert("b".into(), json!(3));
    apply(&mut state, NodePartial::new().with_extra(second));

    let extra = state.extra.snapshot();
    assert_eq!(extra.get("a"), Some(&json!(1)));
    assert_eq!(extra.get("b"), Some(&json!(3)));
}

#[test]
fn docs_are_replaced_not_appended() {
    use modiste::schemas::Document;

    let mut state = AgentState::default();
    apply(
        &mut state,
        NodePartial::new().with_docs(vec![Document::new("one"), Document::new("two")]),
    );
    apply(
        &mut state,
        NodePartial::new().with_docs(vec![Document::new("two")]),
    );
    assert_eq!(state.docs.snapshot().len(), 1);
}

#[test]
fn untouched_channels_keep_their_version() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("noop".into()), NoopNode)
        .add_edge(NodeKind::Start, NodeKind::Custom("noop".into()))
        .add_edge(NodeKind::Custom("noop".into()), NodeKind::End)
        .compile()
        .unwrap();

    let mut state = AgentState::new_with_user_message("q");
    let updated = app
        .apply_update(
            &mut state,
            NodePartial::new().with_messages(vec![Message::assistant("a")]),
        )
        .unwrap();

    assert_eq!(updated, vec!["messages"]);
    assert_eq!(state.messages.version(), 2);
    assert_eq!(state.extra.version(), 1);
    assert_eq!(state.search_retries.version(), 1);
}

#[test]
fn empty_partial_bumps_nothing() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Custom("noop".into()), NoopNode)
        .add_edge(NodeKind::Start, NodeKind::Custom("noop".into()))
        .add_edge(NodeKind::Custom("noop".into()), NodeKind::End)
        .compile()
        .unwrap();

    let mut state = AgentState::new_with_user_message("q");
    let updated = app.apply_update(&mut state, NodePartial::default()).unwrap();
    assert!(updated.is_empty());
    assert_eq!(state.messages.version(), 1);
}

mod common;

use std::sync::Arc;

use modiste::app::{EngineError, RunContext};
use modiste::channels::Channel;
use modiste::graphs::{BranchPredicate, GraphBuilder};
use modiste::node::NodeError;
use modiste::state::AgentState;
use modiste::streaming;
use modiste::types::NodeKind;

use common::{CountingNode, FailingNode, NoopNode, test_config};

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

fn run_ctx() -> (RunContext, streaming::EventDrain) {
    let config = Arc::new(test_config());
    let (stream, drain) = streaming::bounded(config.channel_capacity, config.poll_interval);
    (RunContext { stream, config }, drain)
}

#[tokio::test]
async fn linear_graph_runs_to_end() {
    common::init();
    let app = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_node(custom("b"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), custom("b"))
        .add_edge(custom("b"), NodeKind::End)
        .compile()
        .unwrap();

    let (ctx, _drain) = run_ctx();
    let state = app
        .invoke(AgentState::new_with_user_message("q"), ctx)
        .await
        .unwrap();
    assert_eq!(state.messages.snapshot().len(), 1);
}

#[tokio::test]
async fn cycles_execute_iteratively_until_predicate_exits() {
    common::init();
    let recheck: BranchPredicate = Arc::new(|snapshot| {
        if snapshot.search_retries < 5 {
            "again".to_string()
        } else {
            "done".to_string()
        }
    });
    let app = GraphBuilder::new()
        .add_node(custom("work"), CountingNode)
        .add_edge(NodeKind::Start, custom("work"))
        .add_conditional_edge(
            custom("work"),
            recheck,
            [
                ("again".to_string(), custom("work")),
                ("done".to_string(), NodeKind::End),
            ],
        )
        .compile()
        .unwrap();

    let (ctx, _drain) = run_ctx();
    let state = app.invoke(AgentState::default(), ctx).await.unwrap();
    assert_eq!(state.search_retries.snapshot(), 5);
}

#[tokio::test]
async fn unresolvable_branch_is_fatal() {
    common::init();
    let pick: BranchPredicate = Arc::new(|_| "nowhere".to_string());
    let app = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_conditional_edge(custom("a"), pick, [("mapped".to_string(), NodeKind::End)])
        .compile()
        .unwrap();

    let (ctx, _drain) = run_ctx();
    let err = app.invoke(AgentState::default(), ctx).await.err().unwrap();
    match err {
        EngineError::UnknownBranch { node, branch } => {
            assert_eq!(node, "a");
            assert_eq!(branch, "nowhere");
        }
        other => panic!("expected UnknownBranch, got {other:?}"),
    }
}

#[tokio::test]
async fn node_failure_records_error_event_and_propagates() {
    common::init();
    let app = GraphBuilder::new()
        .add_node(custom("boom"), FailingNode)
        .add_edge(NodeKind::Start, custom("boom"))
        .add_edge(custom("boom"), NodeKind::End)
        .compile()
        .unwrap();

    let (ctx, _drain) = run_ctx();
    let err = app.invoke(AgentState::default(), ctx).await.err().unwrap();
    match err {
        EngineError::NodeFailed { node, step, source } => {
            assert_eq!(node, "boom");
            assert_eq!(step, 1);
            assert!(matches!(source, NodeError::MissingInput { what: "test_key" }));
        }
        other => panic!("expected NodeFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn runaway_cycle_hits_step_limit() {
    common::init();
    let forever: BranchPredicate = Arc::new(|_| "again".to_string());
    let app = GraphBuilder::new()
        .add_node(custom("work"), CountingNode)
        .add_edge(NodeKind::Start, custom("work"))
        .add_conditional_edge(
            custom("work"),
            forever,
            [("again".to_string(), custom("work"))],
        )
        .compile()
        .unwrap();

    let mut config = test_config();
    config.max_steps = 10;
    let config = Arc::new(config);
    let (stream, _drain) = streaming::bounded(config.channel_capacity, config.poll_interval);
    let ctx = RunContext { stream, config };

    let err = app.invoke(AgentState::default(), ctx).await.err().unwrap();
    assert!(matches!(err, EngineError::StepLimit { limit: 10 }));
}

#[tokio::test]
async fn compiled_app_is_reusable_across_runs() {
    common::init();
    let app = GraphBuilder::new()
        .add_node(custom("work"), CountingNode)
        .add_edge(NodeKind::Start, custom("work"))
        .add_edge(custom("work"), NodeKind::End)
        .compile()
        .unwrap();

    for _ in 0..3 {
        let (ctx, _drain) = run_ctx();
        let state = app.invoke(AgentState::default(), ctx).await.unwrap();
        // Fresh state each run: nothing leaks from earlier invocations.
        assert_eq!(state.search_retries.snapshot(), 1);
    }
}

mod common;

use std::sync::Arc;

use serde_json::json;

use modiste::node::Node;
use modiste::nodes::action::{
    ActionNode, TOOL_FAILURE_MESSAGE, TOOL_UNEXPECTED_MESSAGE,
};
use modiste::schemas::ToolOutcome;
use modiste::state::AgentState;
use modiste::streaming::{EventKind, Signal};
use modiste::utils::testing::{BrokenTool, FailingTool};

use common::{drain_all, test_ctx};

#[tokio::test]
async fn retry_bound_is_exact() {
    common::init();
    let tool = Arc::new(FailingTool::new());
    let node = ActionNode::new(tool.clone());
    let (mut ctx, mut drain) = test_ctx("action");
    // Three attempts total for the retryable class.
    let mut config = (*ctx.config).clone();
    config.max_tool_retries = 3;
    ctx.config = Arc::new(config);

    let snapshot = AgentState::new_with_user_message("flaky").snapshot();
    let partial = node.run(snapshot, ctx).await.unwrap();

    assert_eq!(tool.calls(), 3, "exactly max_tool_retries attempts");

    drain.stop_flag().stop();
    let events = drain_all(&mut drain).await;

    let starts = events
        .iter()
        .filter(|e| e.kind == EventKind::Action && !e.is_action_error())
        .count();
    let terminal_errors = events.iter().filter(|e| e.is_action_error()).count();
    let tool_ends = events
        .iter()
        .filter(|e| e.is_signal(Signal::ToolEnd))
        .count();
    assert_eq!(starts, 1);
    assert_eq!(terminal_errors, 1, "one terminal error event, no more");
    assert_eq!(tool_ends, 1, "one tool-end event, no more");

    // Outcome is tagged error with the static user-facing message.
    let outcome: ToolOutcome =
        serde_json::from_value(partial.extra.unwrap()["tool_outcome"].clone()).unwrap();
    match outcome {
        ToolOutcome::Error { user_message } => assert_eq!(user_message, TOOL_FAILURE_MESSAGE),
        other => panic!("expected error outcome, got {other:?}"),
    }
    let messages = partial.messages.unwrap();
    assert_eq!(messages[0].content, TOOL_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unexpected_error_aborts_without_spending_retries() {
    common::init();
    let tool = Arc::new(BrokenTool::new());
    let node = ActionNode::new(tool.clone());
    let (mut ctx, mut drain) = test_ctx("action");
    let mut config = (*ctx.config).clone();
    config.max_tool_retries = 3;
    ctx.config = Arc::new(config);

    let snapshot = AgentState::new_with_user_message("broken").snapshot();
    let partial = node.run(snapshot, ctx).await.unwrap();

    assert_eq!(tool.calls(), 1, "no retry budget consumed");

    drain.stop_flag().stop();
    let events = drain_all(&mut drain).await;
    assert_eq!(events.iter().filter(|e| e.is_action_error()).count(), 1);
    assert_eq!(
        events.iter().filter(|e| e.is_signal(Signal::ToolEnd)).count(),
        1,
        "tool end fires on the abort path too"
    );

    let messages = partial.messages.unwrap();
    assert_eq!(messages[0].content, TOOL_UNEXPECTED_MESSAGE);
}

#[tokio::test]
async fn success_passes_payload_through() {
    use async_trait::async_trait;
    use modiste::node::NodeContext;
    use modiste::nodes::action::{Tool, ToolError};
    use serde_json::Value;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn call(&self, args: Value, _ctx: &NodeContext) -> Result<Value, ToolError> {
            Ok(json!(format!("echo: {}", args["question"].as_str().unwrap_or(""))))
        }
    }

    common::init();
    let node = ActionNode::new(Arc::new(EchoTool));
    let (ctx, mut drain) = test_ctx("action");

    let snapshot = AgentState::new_with_user_message("hello").snapshot();
    let partial = node.run(snapshot, ctx).await.unwrap();

    drain.stop_flag().stop();
    let events = drain_all(&mut drain).await;
    assert!(events.iter().all(|e| !e.is_action_error()));
    assert_eq!(
        events.iter().filter(|e| e.is_signal(Signal::ToolEnd)).count(),
        1
    );

    let outcome: ToolOutcome =
        serde_json::from_value(partial.extra.unwrap()["tool_outcome"].clone()).unwrap();
    assert!(outcome.is_success());
    assert_eq!(partial.messages.unwrap()[0].content, "echo: hello");
}

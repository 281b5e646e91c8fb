//! Tool invocation with bounded retry and user-facing error translation.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::providers::LlmError;
use crate::schemas::ToolOutcome;
use crate::state::StateSnapshot;
use crate::streaming::{Signal, StreamEvent};
use crate::utils::collections::new_attr_map;

/// Static message streamed when a tool exhausts its retry budget.
pub const TOOL_FAILURE_MESSAGE: &str =
    "I'm sorry, but there was an issue while invoking the tool.";

/// Static message streamed when a tool fails in an unexpected way.
pub const TOOL_UNEXPECTED_MESSAGE: &str =
    "I'm sorry, but there was an unexpected issue while invoking the tool.";

/// Tool failure classification the retry loop branches on.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// Transient execution failure; retried up to the configured bound.
    #[error("tool execution failed: {0}")]
    #[diagnostic(code(modiste::tool::execution))]
    Execution(String),

    /// Anything else; aborts immediately without consuming retry budget.
    #[error("unexpected tool failure: {0}")]
    #[diagnostic(code(modiste::tool::unexpected))]
    Unexpected(String),
}

impl From<LlmError> for ToolError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Execution(msg) => ToolError::Execution(msg),
            LlmError::InvalidResponse(msg) => ToolError::Unexpected(msg),
        }
    }
}

/// An invokable external capability.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, args: Value, ctx: &NodeContext) -> Result<Value, ToolError>;
}

/// Node wrapping a [`Tool`] with the call protocol:
///
/// 1. push one start-of-call [`EventKind::Action`](crate::streaming::EventKind) event;
/// 2. retry [`ToolError::Execution`] up to `max_tool_retries` attempts;
/// 3. on exhaustion, stream the static user-facing message as a terminal
///    error event; on [`ToolError::Unexpected`], do the same immediately;
/// 4. push exactly one [`Signal::ToolEnd`] regardless of outcome;
/// 5. record the tagged [`ToolOutcome`] in state for continuation logic.
pub struct ActionNode {
    tool: Arc<dyn Tool>,
}

impl ActionNode {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl Node for ActionNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let tool_name = self.tool.name().to_string();
        let args = json!({ "question": snapshot.user_question });

        ctx.emit(StreamEvent::action(&tool_name)).await?;

        let max_attempts = ctx.config.max_tool_retries.max(1);
        let mut outcome = ToolOutcome::Error {
            user_message: TOOL_FAILURE_MESSAGE.to_string(),
        };

        for attempt in 1..=max_attempts {
            match self.tool.call(args.clone(), &ctx).await {
                Ok(payload) => {
                    outcome = ToolOutcome::Success { payload };
                    break;
                }
                Err(ToolError::Execution(reason)) => {
                    tracing::warn!(
                        tool = %tool_name,
                        attempt,
                        max_attempts,
                        %reason,
                        "retryable tool failure"
                    );
                    if attempt == max_attempts {
                        ctx.emit(StreamEvent::action_error(&tool_name, TOOL_FAILURE_MESSAGE))
                            .await?;
                        outcome = ToolOutcome::Error {
                            user_message: TOOL_FAILURE_MESSAGE.to_string(),
                        };
                    }
                }
                Err(ToolError::Unexpected(reason)) => {
                    tracing::error!(tool = %tool_name, %reason, "unexpected tool failure");
                    ctx.emit(StreamEvent::action_error(&tool_name, TOOL_UNEXPECTED_MESSAGE))
                        .await?;
                    outcome = ToolOutcome::Error {
                        user_message: TOOL_UNEXPECTED_MESSAGE.to_string(),
                    };
                    break;
                }
            }
        }

        ctx.emit(
            StreamEvent::signal(Signal::ToolEnd)
                .with_attr("tool", Value::String(tool_name.clone())),
        )
        .await?;

        let content = match &outcome {
            ToolOutcome::Success { payload } => match payload {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            ToolOutcome::Error { user_message } => user_message.clone(),
        };

        let mut extra = new_attr_map();
        extra.insert("tool_outcome".to_string(), serde_json::to_value(&outcome)?);

        Ok(NodePartial::new()
            .with_messages(vec![Message::tool(&content)])
            .with_extra(extra))
    }
}

//! QA pipeline: a direct model answer behind the action node's retry
//! protocol, for questions that need no retrieval or search.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::message::Message;
use crate::node::NodeContext;
use crate::nodes::action::{Tool, ToolError};
use crate::providers::ChatModel;

const QA_PROMPT: &str = "You are a fashion assistant. Answer the question from your own \
knowledge, briefly and concretely.";

/// Answers the question straight from the model.
pub struct QaTool {
    model: Arc<dyn ChatModel>,
}

impl QaTool {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Tool for QaTool {
    fn name(&self) -> &str {
        "qa"
    }

    async fn call(&self, args: Value, _ctx: &NodeContext) -> Result<Value, ToolError> {
        let question = args
            .get("question")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Unexpected("missing question argument".to_string()))?;

        let answer = self
            .model
            .invoke(&[
                Message::system(QA_PROMPT),
                Message::user(question),
            ])
            .await?;
        Ok(Value::String(answer))
    }
}

//! Language-model capability.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;

/// Language-model failures.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum LlmError {
    /// Transient execution failure; the same call may succeed on retry.
    #[error("language model execution failed: {0}")]
    #[diagnostic(code(modiste::llm::execution))]
    Execution(String),

    /// The model answered, but not in the shape the caller required.
    #[error("malformed model response: {0}")]
    #[diagnostic(code(modiste::llm::invalid_response))]
    InvalidResponse(String),
}

impl LlmError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Execution(_))
    }
}

/// A chat-completion-capable model.
///
/// Implementors only need [`invoke`](Self::invoke); structured and
/// streaming variants have conforming default implementations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete the conversation and return the full response text.
    async fn invoke(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// Ask for a JSON-shaped answer and parse it.
    ///
    /// The default implementation sends the prompt as a user message and
    /// parses the whole response as JSON; a non-JSON response is an
    /// [`LlmError::InvalidResponse`].
    async fn invoke_structured(&self, prompt: &str) -> Result<Value, LlmError> {
        let text = self.invoke(&[Message::user(prompt)]).await?;
        serde_json::from_str(text.trim())
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))
    }

    /// Stream the response as text chunks.
    ///
    /// The default implementation degrades to one chunk holding the full
    /// [`invoke`](Self::invoke) response.
    async fn invoke_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<String, LlmError>>, LlmError> {
        let text = self.invoke(messages).await?;
        Ok(stream::iter(vec![Ok(text)]).boxed())
    }
}

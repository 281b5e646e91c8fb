//! Mock collaborators for unit and integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::Value;

use crate::message::Message;
use crate::node::NodeContext;
use crate::nodes::action::{Tool, ToolError};
use crate::providers::{
    ChatModel, ContentFetcher, FetchError, LlmError, Retriever, RetrieverError, SearchError,
    WebSearch,
};
use crate::schemas::Document;

/// Chat model that replays scripted responses in order.
///
/// `invoke_stream` splits the scripted response on whitespace so consumers
/// observe a multi-chunk token sequence. An optional per-call delay makes
/// cancellation windows testable. Exhausting the script yields a retryable
/// execution error.
pub struct ScriptedChatModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedChatModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts seen so far (last user message of each call).
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn invoke(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(last) = messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Execution("no scripted response left".to_string()))
    }

    async fn invoke_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<String, LlmError>>, LlmError> {
        let text = self.invoke(messages).await?;
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let last = words.len().saturating_sub(1);
        let chunks: Vec<Result<String, LlmError>> = words
            .into_iter()
            .enumerate()
            .map(|(i, word)| Ok(if i == last { word } else { format!("{word} ") }))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

/// Chat model whose every call fails with a retryable execution error.
#[derive(Default)]
pub struct FailingChatModel {
    calls: AtomicU32,
}

impl FailingChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn invoke(&self, _messages: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Execution("model unavailable".to_string()))
    }
}

/// Retriever returning a fixed document set.
pub struct StaticRetriever {
    docs: Vec<Document>,
}

impl StaticRetriever {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, RetrieverError> {
        Ok(self.docs.clone())
    }
}

/// Web search returning a fixed raw payload; counts calls.
pub struct StaticSearch {
    payload: Value,
    calls: AtomicU32,
}

impl StaticSearch {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    async fn search(&self, _query: &str) -> Result<Value, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Fetcher returning a fixed body for every URL.
pub struct StaticFetcher {
    body: String,
}

impl StaticFetcher {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str, _deadline: Duration) -> Result<String, FetchError> {
        Ok(self.body.clone())
    }
}

/// Fetcher that always times out.
#[derive(Default)]
pub struct TimeoutFetcher;

#[async_trait]
impl ContentFetcher for TimeoutFetcher {
    async fn fetch(&self, _url: &str, deadline: Duration) -> Result<String, FetchError> {
        Err(FetchError::Timeout(deadline))
    }
}

/// Tool that fails every call with a retryable error; counts attempts.
#[derive(Default)]
pub struct FailingTool {
    calls: AtomicU32,
}

impl FailingTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing_tool"
    }

    async fn call(&self, _args: Value, _ctx: &NodeContext) -> Result<Value, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::Execution("backend 503".to_string()))
    }
}

/// Tool that fails with an unexpected (non-retryable) error.
#[derive(Default)]
pub struct BrokenTool {
    calls: AtomicU32,
}

impl BrokenTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken_tool"
    }

    async fn call(&self, _args: Value, _ctx: &NodeContext) -> Result<Value, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::Unexpected("invariant violated".to_string()))
    }
}

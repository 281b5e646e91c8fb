//! RAG pipeline: retrieve → grade → summarize.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::providers::{ChatModel, Retriever};
use crate::schemas::Document;
use crate::state::StateSnapshot;
use crate::streaming::{Signal, StreamEvent};

const GRADE_PROMPT: &str = "You grade whether a document is relevant to a user's question. \
Reply with JSON: {\"grade\": \"yes\"} if relevant, {\"grade\": \"no\"} otherwise.";

const SUMMARIZE_PROMPT: &str = "You are a fashion assistant. Answer the user's question using \
only the documents below. Be concrete and concise.";

/// Queries the vector store with the user's question.
pub struct RetrieveNode {
    retriever: Arc<dyn Retriever>,
}

impl RetrieveNode {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node for RetrieveNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let docs = self
            .retriever
            .retrieve(&snapshot.user_question)
            .await
            .map_err(|err| NodeError::Provider {
                capability: "retriever",
                message: err.to_string(),
            })?;

        ctx.emit(
            StreamEvent::metadata("retrieved")
                .with_attr("count", Value::from(docs.len())),
        )
        .await?;

        Ok(NodePartial::new().with_docs(docs))
    }
}

#[derive(Debug, Deserialize)]
struct DocumentGrade {
    grade: String,
}

/// Filters retrieved documents by model-judged relevance.
///
/// Documents are graded concurrently. A grading call that fails keeps its
/// document: dropping content over a transient judgment error would starve
/// the summarizer.
pub struct GradeDocsNode {
    model: Arc<dyn ChatModel>,
}

impl GradeDocsNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    async fn keep(&self, question: &str, doc: &Document) -> bool {
        let prompt = format!(
            "{GRADE_PROMPT}\n\nQuestion: {question}\n\nDocument:\n{}",
            doc.content
        );
        match self.model.invoke_structured(&prompt).await {
            Ok(value) => match serde_json::from_value::<DocumentGrade>(value) {
                Ok(graded) => graded.grade.eq_ignore_ascii_case("yes"),
                Err(err) => {
                    tracing::warn!(error = %err, "unparseable grade, keeping document");
                    true
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "grading call failed, keeping document");
                true
            }
        }
    }
}

#[async_trait]
impl Node for GradeDocsNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let total = snapshot.docs.len();
        let question = snapshot.user_question.clone();

        let kept: Vec<Document> = stream::iter(snapshot.docs.into_iter())
            .map(|doc| {
                let question = question.clone();
                async move {
                    let keep = self.keep(&question, &doc).await;
                    keep.then_some(doc)
                }
            })
            .buffered(ctx.config.parse_batch_size.max(1))
            .filter_map(|doc| async move { doc })
            .collect()
            .await;

        ctx.emit(
            StreamEvent::metadata("graded")
                .with_attr("kept", Value::from(kept.len()))
                .with_attr("total", Value::from(total)),
        )
        .await?;

        Ok(NodePartial::new().with_docs(kept))
    }
}

/// Streams the final answer over the graded documents.
pub struct SummarizeNode {
    model: Arc<dyn ChatModel>,
}

impl SummarizeNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node for SummarizeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let mut context = String::new();
        for (i, doc) in snapshot.docs.iter().enumerate() {
            context.push_str(&format!("[{}] {}\n", i + 1, doc.content));
        }
        let messages = vec![
            Message::system(SUMMARIZE_PROMPT),
            Message::user(&format!(
                "Documents:\n{context}\nQuestion: {}",
                snapshot.user_question
            )),
        ];

        let mut chunks = self.model.invoke_stream(&messages).await?;
        let mut answer = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            ctx.emit(StreamEvent::token(&chunk)).await?;
            answer.push_str(&chunk);
        }
        ctx.emit(StreamEvent::signal(Signal::LlmEnd)).await?;

        Ok(NodePartial::new()
            .with_messages(vec![Message::assistant(&answer)])
            .with_answer(answer))
    }
}

//! Vector-store retrieval capability.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::schemas::Document;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum RetrieverError {
    /// Backend failure; treated as a transient execution error.
    #[error("retriever backend failed: {0}")]
    #[diagnostic(code(modiste::retriever::backend))]
    Backend(String),
}

/// Similarity retrieval over an external vector store.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return documents relevant to `query`, ranked by the backend.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError>;
}

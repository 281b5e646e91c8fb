//! Web-search capability.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum SearchError {
    /// Backend failure; treated as a transient execution error.
    #[error("search backend failed: {0}")]
    #[diagnostic(code(modiste::search::backend))]
    Backend(String),
}

/// External web search.
///
/// Returns the backend's raw JSON so the calling node can enforce the wire
/// contract itself: the response must be an array of `{url, content}`
/// objects, and anything else (a bare string error payload is the classic
/// case) is a fatal contract violation, not a retryable failure.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Value, SearchError>;
}

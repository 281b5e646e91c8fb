//! External capability interfaces.
//!
//! Language-model inference, vector retrieval, web search, and content
//! fetching are collaborators the agent consumes through traits; adapters
//! live outside the core (an HTTP fetcher ships behind the `http` feature).
//! Each trait documents its failure contract: which errors are retryable
//! and which shapes are contract violations.

mod fetch;
mod llm;
mod retriever;
mod search;

pub use fetch::{ContentFetcher, FetchError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use llm::{ChatModel, LlmError};
pub use retriever::{Retriever, RetrieverError};
pub use search::{SearchError, WebSearch};

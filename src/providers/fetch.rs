//! Outbound page-content fetching.

use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum FetchError {
    /// The per-request deadline elapsed. Callers downgrade the affected
    /// item to skipped; a timeout never aborts the enclosing run.
    #[error("fetch timed out after {0:?}")]
    #[diagnostic(code(modiste::fetch::timeout))]
    Timeout(Duration),

    #[error("fetch failed: {0}")]
    #[diagnostic(code(modiste::fetch::request))]
    Request(String),
}

/// Fetches raw text content from a URL within a deadline.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher that reduces HTML pages to their text content.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn strip_html(body: &str) -> String {
        let document = scraper::Html::parse_document(body);
        let mut text = String::new();
        for piece in document.root_element().text() {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(piece);
        }
        text
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(deadline)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout(deadline)
                } else {
                    FetchError::Request(err.to_string())
                }
            })?;
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;
        Ok(Self::strip_html(&body))
    }
}

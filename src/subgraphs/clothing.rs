//! Clothing-search pipeline: filter → extract → search → parse, with a
//! bounded recheck loop back into search while extraction comes up empty.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tracing::instrument;

use crate::channels::errors::{CauseChain, ErrorEvent};
use crate::graphs::BranchPredicate;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::providers::{ChatModel, ContentFetcher, WebSearch};
use crate::schemas::{ClothingItem, SearchHit, SearchQuery};
use crate::state::StateSnapshot;
use crate::streaming::StreamEvent;
use crate::utils::collections::new_attr_map;

/// Extra-channel key the filter node records its verdict under.
pub const IN_DOMAIN_KEY: &str = "clothing_in_domain";

/// Branch values used by this pipeline's conditional edges.
pub const BRANCH_IN_DOMAIN: &str = "in_domain";
pub const BRANCH_OUT_OF_DOMAIN: &str = "out_of_domain";
pub const BRANCH_RETRY: &str = "retry";
pub const BRANCH_DONE: &str = "done";

const FILTER_PROMPT: &str = "Does this question ask about finding or buying clothing items \
(garments, shoes, accessories)? Answer yes or no.";

const EXTRACT_PROMPT_NOTE: &str = "clothing web search";

const PARSE_PROMPT: &str = "Extract clothing items from the page text below. Reply with a JSON \
array of objects; fields (all optional): name, brand, category, price, original_price, color, \
sizes, material, description. Reply with [] if the text contains no clothing items.";

/// Classifies whether the question is in-domain for clothing search.
///
/// Out-of-domain questions end the turn with no results; that is a valid
/// outcome, not an error.
pub struct ClothingFilterNode {
    model: Arc<dyn ChatModel>,
}

impl ClothingFilterNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node for ClothingFilterNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let prompt = format!("{FILTER_PROMPT}\n\nQuestion: {}", snapshot.user_question);
        let response = self.model.invoke(&[Message::user(&prompt)]).await?;
        let in_domain = response.trim().to_lowercase().contains("yes");
        tracing::debug!(in_domain, "clothing filter verdict");

        let mut extra = new_attr_map();
        extra.insert(IN_DOMAIN_KEY.to_string(), Value::Bool(in_domain));
        Ok(NodePartial::new().with_extra(extra))
    }
}

/// Conditional-edge predicate reading the filter verdict.
pub fn filter_branch() -> BranchPredicate {
    Arc::new(|snapshot| {
        let in_domain = snapshot
            .extra
            .get(IN_DOMAIN_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if in_domain {
            BRANCH_IN_DOMAIN.to_string()
        } else {
            BRANCH_OUT_OF_DOMAIN.to_string()
        }
    })
}

/// Derives the search query from the user's question.
///
/// The question text is used directly; per-model rewrite prompts proved too
/// brittle to keep in the hot path.
pub struct ExtractQueryNode;

#[async_trait]
impl Node for ExtractQueryNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        if snapshot.user_question.is_empty() {
            return Err(NodeError::MissingInput {
                what: "user_question",
            });
        }
        tracing::debug!(target = EXTRACT_PROMPT_NOTE, "derived search query");
        Ok(NodePartial::new().with_search_item(SearchQuery::new(snapshot.user_question)))
    }
}

/// Calls the web-search capability and validates the response shape.
pub struct ClothingSearchNode {
    search: Arc<dyn WebSearch>,
}

impl ClothingSearchNode {
    pub fn new(search: Arc<dyn WebSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Node for ClothingSearchNode {
    #[instrument(skip(self, snapshot, ctx), err)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let query = snapshot
            .search_item
            .as_ref()
            .map(|item| item.query.clone())
            .ok_or(NodeError::MissingInput {
                what: "search_item",
            })?;

        let raw = self
            .search
            .search(&query)
            .await
            .map_err(|err| NodeError::Provider {
                capability: "web_search",
                message: err.to_string(),
            })?;

        // The backend must hand back a list of hits. Anything else (a bare
        // string error payload, an object) will not change on retry.
        let entries = match raw {
            Value::Array(entries) => entries,
            other => {
                return Err(NodeError::ContractViolation {
                    capability: "web_search",
                    detail: format!("expected an array of hits, got: {other}"),
                });
            }
        };

        let mut hits: Vec<SearchHit> = Vec::new();
        for entry in entries {
            match serde_json::from_value::<SearchHit>(entry) {
                Ok(hit) => hits.push(hit),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed search hit");
                }
            }
        }
        hits.truncate(ctx.config.max_search_results);

        ctx.emit(
            StreamEvent::metadata("search_results")
                .with_attr("count", Value::from(hits.len()))
                .with_attr("attempt", Value::from(snapshot.search_retries + 1)),
        )
        .await?;

        Ok(NodePartial::new()
            .with_search_results(hits)
            .with_search_retries(1))
    }
}

/// Fetches each hit's page, chunks it, and extracts clothing items with the
/// structured model, streaming every item to the consumer as soon as it is
/// extracted.
///
/// All per-hit and per-chunk failures (timeouts, fetch errors, extraction
/// misses) are recorded and skipped; none of them abort the run.
pub struct ClothingParseNode {
    fetcher: Arc<dyn ContentFetcher>,
    model: Arc<dyn ChatModel>,
}

impl ClothingParseNode {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, model: Arc<dyn ChatModel>) -> Self {
        Self { fetcher, model }
    }

    async fn parse_hit(
        &self,
        hit: &SearchHit,
        ctx: &NodeContext,
    ) -> Result<Vec<ClothingItem>, CauseChain> {
        let page = self
            .fetcher
            .fetch(&hit.url, ctx.config.fetch_timeout)
            .await
            .map_err(|err| {
                CauseChain::msg("content fetch failed")
                    .with_cause(CauseChain::msg(err.to_string()))
                    .with_details(serde_json::json!({ "url": hit.url }))
            })?;

        let text = if page.trim().is_empty() {
            hit.content.clone()
        } else {
            page
        };

        let batch = ctx.config.parse_batch_size.max(1);
        let extracted: Vec<Vec<ClothingItem>> = stream::iter(chunk_text(&text, ctx.config.chunk_size))
            .map(|chunk| async move { self.extract_chunk(&chunk, &hit.url, ctx).await })
            .buffered(batch)
            .collect()
            .await;

        Ok(extracted.into_iter().flatten().collect())
    }

    /// Extract items from one chunk; failures yield an empty list.
    async fn extract_chunk(
        &self,
        chunk: &str,
        source_url: &str,
        ctx: &NodeContext,
    ) -> Vec<ClothingItem> {
        let prompt = format!("{PARSE_PROMPT}\n\nPage text:\n{chunk}");
        let value = match self.model.invoke_structured(&prompt).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(url = source_url, error = %err, "chunk extraction failed");
                return Vec::new();
            }
        };

        let raw_items = match value {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            _ => return Vec::new(),
        };

        let mut items = Vec::new();
        for raw in raw_items {
            match serde_json::from_value::<ClothingItem>(raw) {
                Ok(mut item) => {
                    item.source_url = Some(source_url.to_string());
                    match StreamEvent::item(&item) {
                        Ok(event) => {
                            // Stream each item the moment it exists; the
                            // consumer must not wait for the whole parse.
                            if ctx.emit(event).await.is_err() {
                                tracing::debug!("consumer gone, continuing extraction");
                            }
                            items.push(item);
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "unserializable item skipped")
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(url = source_url, error = %err, "skipping malformed item");
                }
            }
        }
        items
    }
}

#[async_trait]
impl Node for ClothingParseNode {
    #[instrument(skip(self, snapshot, ctx), err)]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let batch = ctx.config.parse_batch_size.max(1);
        let step = ctx.step;

        let outcomes: Vec<(String, Result<Vec<ClothingItem>, CauseChain>)> =
            stream::iter(snapshot.search_results.iter().cloned())
                .map(|hit| {
                    let ctx = ctx.clone();
                    async move { (hit.url.clone(), self.parse_hit(&hit, &ctx).await) }
                })
                .buffer_unordered(batch)
                .collect()
                .await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(mut extracted) => items.append(&mut extracted),
                Err(cause) => {
                    tracing::warn!(%url, error = %cause, "skipping failed hit");
                    errors.push(
                        ErrorEvent::node(ctx.node_id.clone(), step, cause).with_tag("skipped"),
                    );
                }
            }
        }

        tracing::debug!(items = items.len(), skipped = errors.len(), "parse pass finished");

        let mut partial = NodePartial::new().with_parsed_results(items);
        if !errors.is_empty() {
            partial = partial.with_errors(errors);
        }
        Ok(partial)
    }
}

/// Conditional-edge predicate for the recheck decision: loop back into
/// search while no items were extracted and the retry ceiling allows it.
///
/// `max_retries` counts retries beyond the initial attempt, so a ceiling of
/// 2 permits 3 search passes in total.
pub fn recheck_branch(max_retries: u32) -> BranchPredicate {
    Arc::new(move |snapshot| {
        if snapshot.parsed_results.is_empty() && snapshot.search_retries <= max_retries {
            BRANCH_RETRY.to_string()
        } else {
            BRANCH_DONE.to_string()
        }
    })
}

/// Split text into whitespace-aligned chunks of at most `max_len` chars.
fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_respects_bounds() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = chunk_text(text, 11);
        assert!(chunks.iter().all(|c| c.len() <= 11));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn chunk_text_keeps_oversized_word_whole() {
        let chunks = chunk_text("supercalifragilistic", 5);
        assert_eq!(chunks, vec!["supercalifragilistic".to_string()]);
    }

    #[test]
    fn recheck_loops_until_ceiling() {
        let predicate = recheck_branch(2);
        let mut snapshot = StateSnapshot::default();

        snapshot.search_retries = 1;
        assert_eq!(predicate(&snapshot), BRANCH_RETRY);
        snapshot.search_retries = 2;
        assert_eq!(predicate(&snapshot), BRANCH_RETRY);
        snapshot.search_retries = 3;
        assert_eq!(predicate(&snapshot), BRANCH_DONE);
    }

    #[test]
    fn recheck_stops_once_items_exist() {
        let predicate = recheck_branch(2);
        let mut snapshot = StateSnapshot::default();
        snapshot.search_retries = 1;
        snapshot.parsed_results.push(ClothingItem::default());
        assert_eq!(predicate(&snapshot), BRANCH_DONE);
    }
}

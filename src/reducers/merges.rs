//! Concrete reducers, one per channel family.

use super::Reducer;
use crate::channels::Channel;
use crate::node::NodePartial;
use crate::state::AgentState;

/// Append new messages to the conversation, preserving order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddMessages;

impl Reducer for AddMessages {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(messages) = &update.messages
            && !messages.is_empty()
        {
            state.messages.get_mut().extend(messages.iter().cloned());
        }
    }
}

/// Last write wins for the user's question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetQuestion;

impl Reducer for SetQuestion {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(question) = &update.user_question {
            *state.user_question.get_mut() = question.clone();
        }
    }
}

/// Last write wins for the routed subgraph name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectRoute;

impl Reducer for SelectRoute {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(name) = &update.selected_subgraph {
            *state.selected_subgraph.get_mut() = Some(name.clone());
        }
    }
}

/// Field-wise merge of the search query: populated fields in the update
/// overlay the stored query, untouched fields survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeSearchItem;

impl Reducer for MergeSearchItem {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(item) = &update.search_item {
            let slot = state.search_item.get_mut();
            *slot = match slot.take() {
                Some(existing) => Some(existing.merged_with(item)),
                None => Some(item.clone()),
            };
        }
    }
}

/// Append raw search hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppendSearchResults;

impl Reducer for AppendSearchResults {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(hits) = &update.search_results
            && !hits.is_empty()
        {
            state.search_results.get_mut().extend(hits.iter().cloned());
        }
    }
}

/// Append extracted clothing items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppendParsedResults;

impl Reducer for AppendParsedResults {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(items) = &update.parsed_results
            && !items.is_empty()
        {
            state.parsed_results.get_mut().extend(items.iter().cloned());
        }
    }
}

/// Additive accumulator for the search attempt counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddRetries;

impl Reducer for AddRetries {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(delta) = update.search_retries {
            let counter = state.search_retries.get_mut();
            *counter = counter.saturating_add(delta);
        }
    }
}

/// Replace the retrieved document set; grading filters in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplaceDocs;

impl Reducer for ReplaceDocs {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(docs) = &update.docs {
            *state.docs.get_mut() = docs.clone();
        }
    }
}

/// Concatenate streamed answer text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcatAnswer;

impl Reducer for ConcatAnswer {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(chunk) = &update.answer
            && !chunk.is_empty()
        {
            state.answer.get_mut().push_str(chunk);
        }
    }
}

/// Shallow merge of the free-form metadata map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(extras) = &update.extra
            && !extras.is_empty()
        {
            let map = state.extra.get_mut();
            for (k, v) in extras.iter() {
                map.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Append recoverable error events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddErrors;

impl Reducer for AddErrors {
    fn apply(&self, state: &mut AgentState, update: &NodePartial) {
        if let Some(errors) = &update.errors
            && !errors.is_empty()
        {
            state.errors.get_mut().extend(errors.iter().cloned());
        }
    }
}

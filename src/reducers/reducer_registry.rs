use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::{
    AddErrors, AddMessages, AddRetries, AppendParsedResults, AppendSearchResults, ConcatAnswer,
    MapMerge, MergeSearchItem, Reducer, ReducerError, ReplaceDocs, SelectRoute, SetQuestion,
};
use crate::node::NodePartial;
use crate::state::AgentState;
use crate::types::ChannelType;

/// Maps each channel to the reducers applied for it, in registration order.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Vec<Arc<dyn Reducer>>>,
}

/// Whether a partial actually carries data for the given channel; lets the
/// registry skip reducers with nothing to do.
fn channel_guard(channel: &ChannelType, partial: &NodePartial) -> bool {
    match channel {
        ChannelType::Message => partial
            .messages
            .as_ref()
            .is_some_and(|v| !v.is_empty()),
        ChannelType::Question => partial.user_question.is_some(),
        ChannelType::Route => partial.selected_subgraph.is_some(),
        ChannelType::SearchItem => partial.search_item.is_some(),
        ChannelType::SearchResults => partial
            .search_results
            .as_ref()
            .is_some_and(|v| !v.is_empty()),
        ChannelType::ParsedResults => partial
            .parsed_results
            .as_ref()
            .is_some_and(|v| !v.is_empty()),
        ChannelType::SearchRetries => partial.search_retries.is_some(),
        ChannelType::Docs => partial.docs.is_some(),
        ChannelType::Answer => partial.answer.as_ref().is_some_and(|s| !s.is_empty()),
        ChannelType::Extra => partial.extra.as_ref().is_some_and(|m| !m.is_empty()),
        ChannelType::Error => partial.errors.as_ref().is_some_and(|v| !v.is_empty()),
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(ChannelType::Message, Arc::new(AddMessages))
            .register(ChannelType::Question, Arc::new(SetQuestion))
            .register(ChannelType::Route, Arc::new(SelectRoute))
            .register(ChannelType::SearchItem, Arc::new(MergeSearchItem))
            .register(ChannelType::SearchResults, Arc::new(AppendSearchResults))
            .register(ChannelType::ParsedResults, Arc::new(AppendParsedResults))
            .register(ChannelType::SearchRetries, Arc::new(AddRetries))
            .register(ChannelType::Docs, Arc::new(ReplaceDocs))
            .register(ChannelType::Answer, Arc::new(ConcatAnswer))
            .register(ChannelType::Extra, Arc::new(MapMerge))
            .register(ChannelType::Error, Arc::new(AddErrors));
        registry
    }
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Register a reducer for a channel. Multiple reducers on one channel
    /// run in registration order.
    pub fn register(&mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducer_map.entry(channel).or_default().push(reducer);
        self
    }

    /// Apply the reducers for one channel if the partial has data for it.
    pub fn try_update(
        &self,
        channel_type: ChannelType,
        state: &mut AgentState,
        to_update: &NodePartial,
    ) -> Result<(), ReducerError> {
        if !channel_guard(&channel_type, to_update) {
            return Ok(());
        }

        if let Some(reducers) = self.reducer_map.get(&channel_type) {
            for reducer in reducers {
                reducer.apply(state, to_update);
            }
            Ok(())
        } else {
            Err(ReducerError::UnknownChannel(channel_type))
        }
    }

    /// Apply every registered channel; the guard skips channels the partial
    /// carries no data for.
    pub fn apply_all(
        &self,
        state: &mut AgentState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        for channel in self.reducer_map.keys() {
            self.try_update(channel.clone(), state, update)?;
        }
        Ok(())
    }
}

//! State merge strategies.
//!
//! Every channel of [`AgentState`](crate::state::AgentState) has a reducer
//! registered in [`ReducerRegistry`]; the engine feeds each node's
//! [`NodePartial`](crate::node::NodePartial) through the registry so sparse
//! updates merge instead of overwriting.

mod merges;
mod reducer_registry;

pub use merges::{
    AddErrors, AddMessages, AddRetries, AppendParsedResults, AppendSearchResults, ConcatAnswer,
    MapMerge, MergeSearchItem, ReplaceDocs, SelectRoute, SetQuestion,
};
pub use reducer_registry::ReducerRegistry;

use crate::node::NodePartial;
use crate::state::AgentState;
use crate::types::ChannelType;
use std::fmt;

/// Unified reducer trait: mutate `AgentState` using one channel's slice of a
/// `NodePartial` delta.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut AgentState, update: &NodePartial);
}

#[derive(Debug)]
pub enum ReducerError {
    UnknownChannel(ChannelType),
}

impl fmt::Display for ReducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerError::UnknownChannel(channel) => {
                write!(f, "no reducer registered for channel: {channel}")
            }
        }
    }
}

impl std::error::Error for ReducerError {}

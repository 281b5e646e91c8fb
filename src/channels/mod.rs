//! Versioned channel storage backing [`AgentState`](crate::state::AgentState).
//!
//! Each state field lives in its own [`VersionedChannel`]: a value plus a
//! version counter. Reducers mutate the value; the engine bumps the version
//! only when the merged content actually changed, so untouched channels keep
//! their version across a step.

pub mod errors;

pub use errors::{CauseChain, ErrorEvent, ErrorScope};

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::message::Message;
use crate::schemas::{ClothingItem, Document, SearchHit, SearchQuery};

/// Common access surface for versioned state channels.
pub trait Channel {
    type Value: Clone;

    /// Borrow the current value.
    fn get(&self) -> &Self::Value;

    /// Mutably borrow the current value. Does not bump the version; the
    /// engine owns version bookkeeping at merge time.
    fn get_mut(&mut self) -> &mut Self::Value;

    /// Clone the current value out of the channel.
    fn snapshot(&self) -> Self::Value {
        self.get().clone()
    }

    fn version(&self) -> u32;

    fn set_version(&mut self, version: u32);
}

/// A value paired with a monotonically increasing version.
///
/// # Examples
///
/// ```rust
/// use modiste::channels::{Channel, VersionedChannel};
///
/// let mut ch: VersionedChannel<Vec<u32>> = VersionedChannel::default();
/// assert_eq!(ch.version(), 1);
/// ch.get_mut().push(7);
/// ch.set_version(2);
/// assert_eq!(ch.snapshot(), vec![7]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedChannel<T> {
    value: T,
    version: u32,
}

impl<T: Clone> VersionedChannel<T> {
    pub fn new(value: T, version: u32) -> Self {
        Self { value, version }
    }

    /// A freshly seeded channel at version 1.
    pub fn seeded(value: T) -> Self {
        Self::new(value, 1)
    }
}

impl<T: Clone + Default> Default for VersionedChannel<T> {
    fn default() -> Self {
        Self::seeded(T::default())
    }
}

impl<T: Clone> Channel for VersionedChannel<T> {
    type Value = T;

    fn get(&self) -> &T {
        &self.value
    }

    fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

pub type MessagesChannel = VersionedChannel<Vec<Message>>;
pub type QuestionChannel = VersionedChannel<String>;
pub type RouteChannel = VersionedChannel<Option<String>>;
pub type SearchItemChannel = VersionedChannel<Option<SearchQuery>>;
pub type SearchResultsChannel = VersionedChannel<Vec<SearchHit>>;
pub type ParsedResultsChannel = VersionedChannel<Vec<ClothingItem>>;
pub type RetriesChannel = VersionedChannel<u32>;
pub type DocsChannel = VersionedChannel<Vec<Document>>;
pub type AnswerChannel = VersionedChannel<String>;
pub type ExtrasChannel = VersionedChannel<FxHashMap<String, Value>>;
pub type ErrorsChannel = VersionedChannel<Vec<ErrorEvent>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_channel_starts_at_version_one() {
        let ch = VersionedChannel::seeded(vec![Message::user("hi")]);
        assert_eq!(ch.version(), 1);
        assert_eq!(ch.get().len(), 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut ch: ExtrasChannel = VersionedChannel::default();
        ch.get_mut()
            .insert("k".to_string(), serde_json::json!("v"));
        let snap = ch.snapshot();
        ch.get_mut().clear();
        assert_eq!(snap.get("k"), Some(&serde_json::json!("v")));
        assert!(ch.get().is_empty());
    }
}

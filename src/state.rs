//! Conversation state for agent runs.
//!
//! [`AgentState`] holds one versioned channel per state field. Nodes never
//! see or mutate it directly: they receive an immutable [`StateSnapshot`]
//! and return a sparse [`NodePartial`](crate::node::NodePartial), which the
//! engine merges through the per-channel reducers.
//!
//! # Examples
//!
//! ```rust
//! use modiste::channels::Channel;
//! use modiste::state::AgentState;
//!
//! let state = AgentState::new_with_user_message("What should I wear to a summer wedding?");
//! let snap = state.snapshot();
//! assert_eq!(snap.messages.len(), 1);
//! assert_eq!(snap.user_question, "What should I wear to a summer wedding?");
//! assert!(snap.selected_subgraph.is_none());
//! assert_eq!(snap.search_retries, 0);
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::{
    AnswerChannel, Channel, DocsChannel, ErrorsChannel, ExtrasChannel, MessagesChannel,
    ParsedResultsChannel, QuestionChannel, RetriesChannel, RouteChannel, SearchItemChannel,
    SearchResultsChannel, VersionedChannel,
};
use crate::channels::errors::ErrorEvent;
use crate::message::Message;
use crate::schemas::{ClothingItem, Document, SearchHit, SearchQuery};

/// The state container for one conversational turn.
///
/// Channels and their merge semantics:
///
/// | channel            | reducer                  |
/// |--------------------|--------------------------|
/// | `messages`         | append                   |
/// | `user_question`    | last write wins          |
/// | `selected_subgraph`| last write wins          |
/// | `search_item`      | field-wise merge         |
/// | `search_results`   | append                   |
/// | `parsed_results`   | append                   |
/// | `search_retries`   | additive accumulator     |
/// | `docs`             | replace                  |
/// | `answer`           | concatenation            |
/// | `extra`            | shallow map merge        |
/// | `errors`           | append                   |
#[derive(Clone, Debug, PartialEq)]
pub struct AgentState {
    pub messages: MessagesChannel,
    pub user_question: QuestionChannel,
    pub selected_subgraph: RouteChannel,
    pub search_item: SearchItemChannel,
    pub search_results: SearchResultsChannel,
    pub parsed_results: ParsedResultsChannel,
    pub search_retries: RetriesChannel,
    pub docs: DocsChannel,
    pub answer: AnswerChannel,
    pub extra: ExtrasChannel,
    pub errors: ErrorsChannel,
}

/// Immutable copy of the state handed to nodes.
///
/// Snapshots are deep copies: later state mutation never shows through.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub user_question: String,
    pub selected_subgraph: Option<String>,
    pub search_item: Option<SearchQuery>,
    pub search_results: Vec<SearchHit>,
    pub parsed_results: Vec<ClothingItem>,
    pub search_retries: u32,
    pub docs: Vec<Document>,
    pub answer: String,
    pub extra: FxHashMap<String, Value>,
    pub errors: Vec<ErrorEvent>,
}

impl AgentState {
    /// State for a turn consisting of a single user message.
    pub fn new_with_user_message(user_text: &str) -> Self {
        Self::new_with_conversation(vec![Message::user(user_text)])
    }

    /// State seeded from an existing conversation history.
    ///
    /// `user_question` is taken from the most recent user message; an empty
    /// conversation leaves it blank.
    pub fn new_with_conversation(messages: Vec<Message>) -> Self {
        let question = messages
            .iter()
            .rev()
            .find(|m| m.has_role(Message::USER))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Self {
            messages: VersionedChannel::seeded(messages),
            user_question: VersionedChannel::seeded(question),
            selected_subgraph: VersionedChannel::default(),
            search_item: VersionedChannel::default(),
            search_results: VersionedChannel::default(),
            parsed_results: VersionedChannel::default(),
            search_retries: VersionedChannel::default(),
            docs: VersionedChannel::default(),
            answer: VersionedChannel::default(),
            extra: VersionedChannel::default(),
            errors: VersionedChannel::default(),
        }
    }

    /// Builder for states with custom initial data.
    ///
    /// ```rust
    /// use modiste::state::AgentState;
    /// use serde_json::json;
    ///
    /// let state = AgentState::builder()
    ///     .with_user_message("any cashmere sweaters under $100?")
    ///     .with_extra("session", json!("s-42"))
    ///     .build();
    /// assert_eq!(state.snapshot().extra.len(), 1);
    /// ```
    pub fn builder() -> AgentStateBuilder {
        AgentStateBuilder::default()
    }

    /// Take an immutable deep snapshot of every channel.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            user_question: self.user_question.snapshot(),
            selected_subgraph: self.selected_subgraph.snapshot(),
            search_item: self.search_item.snapshot(),
            search_results: self.search_results.snapshot(),
            parsed_results: self.parsed_results.snapshot(),
            search_retries: self.search_retries.snapshot(),
            docs: self.docs.snapshot(),
            answer: self.answer.snapshot(),
            extra: self.extra.snapshot(),
            errors: self.errors.snapshot(),
        }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new_with_conversation(Vec::new())
    }
}

/// Fluent builder for [`AgentState`].
#[derive(Debug, Default)]
pub struct AgentStateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl AgentStateBuilder {
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    pub fn with_message(mut self, role: &str, content: &str) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> AgentState {
        let mut state = AgentState::new_with_conversation(self.messages);
        state.extra = VersionedChannel::seeded(self.extra);
        state
    }
}

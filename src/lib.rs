//! # Modiste: a conversational agent backend for fashion Q&A
//!
//! Modiste routes a user's question to one of several reasoning pipelines
//! ("subgraphs"), executes multi-step tool use over a directed graph, and
//! streams incremental results to the caller through a bounded channel with
//! mid-run cancellation.
//!
//! ## Core Concepts
//!
//! - **Nodes**: async units of work over immutable state snapshots
//! - **State**: versioned channels merged through per-channel reducers
//! - **Graph**: declarative topology with conditional branch tables,
//!   executed by an iterative dispatch loop (cycles welcome)
//! - **Streaming**: one bounded queue + stop flag per run; blocking `push`
//!   is the backpressure
//! - **Router**: one LLM classification per turn over the registered
//!   subgraph descriptions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modiste::message::Message;
//! use modiste::runtimes::{AgentConfig, AgentService, Collaborators, InMemoryRunRegistry};
//! use modiste::streaming::Signal;
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let service = AgentService::new(
//!     AgentConfig::from_env(),
//!     collaborators,
//!     Arc::new(InMemoryRunRegistry::new()),
//! )?;
//!
//! let mut run = service
//!     .submit_turn(vec![Message::user("What are the trending colors this fall?")])
//!     .await;
//!
//! while let Some(event) = run.next_event().await {
//!     if event.is_signal(Signal::End) {
//!         break;
//!     }
//!     println!("{}", event.payload);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`message`] - Conversation messages
//! - [`state`] / [`channels`] / [`reducers`] - Versioned, reducer-merged state
//! - [`node`] - The node trait and partial updates
//! - [`graphs`] / [`app`] - Graph definition, compilation, and execution
//! - [`streaming`] - The bounded event pipe and stop flag
//! - [`router`] / [`subgraph`] - Subgraph selection
//! - [`nodes`] / [`subgraphs`] - Concrete pipelines
//! - [`providers`] - External capability traits
//! - [`runtimes`] - Configuration, run registry, and the service facade

pub mod app;
pub mod channels;
pub mod graphs;
pub mod message;
pub mod node;
pub mod nodes;
pub mod providers;
pub mod reducers;
pub mod router;
pub mod runtimes;
pub mod schemas;
pub mod state;
pub mod streaming;
pub mod subgraph;
pub mod subgraphs;
pub mod telemetry;
pub mod types;
pub mod utils;

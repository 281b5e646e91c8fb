//! Run management: configuration, the run registry, the run driver, and
//! the service facade that assembles the agent graph.

pub mod config;
pub mod registry;
pub mod runner;
pub mod service;

pub use config::AgentConfig;
pub use registry::{InMemoryRunRegistry, RunRegistry};
pub use runner::{
    ROUTING_FAILURE_MESSAGE, RUN_FAILURE_MESSAGE, RunError, RunHandle,
};
pub use service::{AgentService, Collaborators, build_agent_graph, default_subgraphs};

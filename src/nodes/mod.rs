//! Graph-agnostic node implementations.
//!
//! Subgraph-specific nodes live in [`crate::subgraphs`]; this module holds
//! the pieces every pipeline shares: tool invocation with bounded retry and
//! the router node.

pub mod action;
pub mod select;

pub use action::{ActionNode, Tool, ToolError, TOOL_FAILURE_MESSAGE, TOOL_UNEXPECTED_MESSAGE};
pub use select::{SelectSubgraphNode, route_branch};

//! Graph definition and compilation.
//!
//! [`GraphBuilder`] declares nodes plus unconditional and conditional edges
//! and compiles them into an executable [`App`](crate::app::App). The
//! virtual `Start` and `End` endpoints anchor the topology; conditional
//! edges carry a predicate and an explicit branch-value table, so routing
//! mistakes surface as compile or run-time configuration errors instead of
//! silent defaults.

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{BranchPredicate, ConditionalEdge};

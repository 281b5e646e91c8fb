//! Concrete reasoning pipelines composed from the graph engine.
//!
//! Each subgraph contributes its nodes and branch predicates; the service
//! wires them into one compiled graph behind the router.

pub mod clothing;
pub mod qa;
pub mod rag;

pub use clothing::{
    ClothingFilterNode, ClothingParseNode, ClothingSearchNode, ExtractQueryNode, filter_branch,
    recheck_branch,
};
pub use qa::QaTool;
pub use rag::{GradeDocsNode, RetrieveNode, SummarizeNode};

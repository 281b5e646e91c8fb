mod common;

use std::sync::Arc;

use modiste::graphs::{BranchPredicate, GraphBuilder, GraphCompileError};
use modiste::types::NodeKind;

use common::NoopNode;

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

#[test]
fn compile_rejects_empty_graph() {
    let err = GraphBuilder::new().compile().err().unwrap();
    assert!(matches!(err, GraphCompileError::MissingEntry));
}

#[test]
fn compile_rejects_missing_entry_edge() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_edge(custom("a"), NodeKind::End)
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::MissingEntry));
}

#[test]
fn compile_rejects_second_unconditional_edge() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_node(custom("b"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), custom("b"))
        .add_edge(custom("a"), NodeKind::End)
        .add_edge(custom("b"), NodeKind::End)
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::DuplicateEdge { .. }));
}

#[test]
fn compile_rejects_mixed_edge_kinds_on_one_node() {
    let always_end: BranchPredicate = Arc::new(|_| "end".to_string());
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), NodeKind::End)
        .add_conditional_edge(custom("a"), always_end, [("end".to_string(), NodeKind::End)])
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::ConflictingEdges { .. }));
}

#[test]
fn compile_rejects_unknown_edge_target() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), custom("ghost"))
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::UnknownTarget { .. }));
}

#[test]
fn compile_rejects_unknown_branch_target() {
    let pick: BranchPredicate = Arc::new(|_| "x".to_string());
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_conditional_edge(custom("a"), pick, [("x".to_string(), custom("ghost"))])
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::UnknownBranchTarget { .. }));
}

#[test]
fn compile_rejects_dead_end_node() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_node(custom("stuck"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), NodeKind::End)
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::DeadEnd { .. }));
}

#[test]
fn compile_rejects_duplicate_node_names() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), NoopNode)
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), NodeKind::End)
        .compile()
        .err()
        .unwrap();
    assert!(matches!(err, GraphCompileError::DuplicateNode { .. }));
}

#[test]
fn virtual_endpoints_cannot_be_registered() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::Start, NoopNode)
        .add_node(NodeKind::End, NoopNode)
        .add_node(custom("a"), NoopNode)
        .add_edge(NodeKind::Start, custom("a"))
        .add_edge(custom("a"), NodeKind::End)
        .compile()
        .unwrap();
    assert_eq!(app.nodes().len(), 1);
}

#[test]
fn cycles_compile() {
    let recheck: BranchPredicate = Arc::new(|snapshot| {
        if snapshot.search_retries < 3 {
            "again".to_string()
        } else {
            "done".to_string()
        }
    });
    let app = GraphBuilder::new()
        .add_node(custom("work"), NoopNode)
        .add_edge(NodeKind::Start, custom("work"))
        .add_conditional_edge(
            custom("work"),
            recheck,
            [
                ("again".to_string(), custom("work")),
                ("done".to_string(), NodeKind::End),
            ],
        )
        .compile()
        .unwrap();
    assert_eq!(app.conditional_edges().len(), 1);
}

//! Edge types for static and predicate-driven routing.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Predicate evaluated against the current state to pick a branch value.
///
/// The returned string is looked up in the conditional edge's branch table;
/// a value with no table entry is a fatal configuration error at run time.
///
/// # Examples
///
/// ```rust
/// use modiste::graphs::BranchPredicate;
/// use std::sync::Arc;
///
/// let recheck: BranchPredicate = Arc::new(|snapshot| {
///     if snapshot.parsed_results.is_empty() && snapshot.search_retries <= 2 {
///         "retry".to_string()
///     } else {
///         "done".to_string()
///     }
/// });
/// ```
pub type BranchPredicate = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge: a predicate plus a branch-value → target table.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    predicate: BranchPredicate,
    branches: FxHashMap<String, NodeKind>,
}

impl ConditionalEdge {
    pub fn new(
        from: impl Into<NodeKind>,
        predicate: BranchPredicate,
        branches: impl IntoIterator<Item = (String, NodeKind)>,
    ) -> Self {
        Self {
            from: from.into(),
            predicate,
            branches: branches.into_iter().collect(),
        }
    }

    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    pub fn branches(&self) -> &FxHashMap<String, NodeKind> {
        &self.branches
    }

    /// Evaluate the predicate and resolve the branch through the table.
    ///
    /// Returns the raw branch value alongside the target so callers can
    /// report unresolvable branches precisely.
    pub fn evaluate(&self, snapshot: &StateSnapshot) -> (String, Option<&NodeKind>) {
        let branch = (self.predicate)(snapshot);
        let target = self.branches.get(&branch);
        (branch, target)
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("branches", &self.branches)
            .finish_non_exhaustive()
    }
}

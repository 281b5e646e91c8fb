//! Subgraph descriptors and the ordered registry the router selects from.

use crate::types::NodeKind;

/// One registered reasoning pipeline.
///
/// The description is used verbatim in the routing prompt; the entry node
/// is where execution continues once the router picks this subgraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subgraph {
    pub name: String,
    pub description: String,
    pub entry: NodeKind,
}

impl Subgraph {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        entry: impl Into<NodeKind>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            entry: entry.into(),
        }
    }
}

/// Ordered collection of subgraphs, built once at startup and immutable for
/// the process lifetime. Registration order is significant: the router
/// scans model output for names in this order, first match wins.
#[derive(Clone, Debug, Default)]
pub struct SubgraphRegistry {
    items: Vec<Subgraph>,
}

impl SubgraphRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subgraph. A duplicate name replaces nothing and is
    /// ignored with a warning; names are the routing keys and must stay
    /// unique.
    #[must_use]
    pub fn register(mut self, subgraph: Subgraph) -> Self {
        if self.items.iter().any(|s| s.name == subgraph.name) {
            tracing::warn!(name = %subgraph.name, "ignoring duplicate subgraph registration");
            return self;
        }
        self.items.push(subgraph);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subgraph> {
        self.items.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Subgraph> {
        self.items.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(name, entry)` pairs in registration order, for wiring the router's
    /// conditional edge.
    pub fn branch_table(&self) -> impl Iterator<Item = (String, NodeKind)> + '_ {
        self.items.iter().map(|s| (s.name.clone(), s.entry.clone()))
    }
}

//! In-memory graph store.
//!
//! Two append-only, insertion-ordered maps keyed by ID. Adds are idempotent:
//! the first write wins and later writers see `false`. Stages rely on
//! first-write-wins, so the store never updates in place; the whole store is
//! dropped at the end of a session or replaced atomically by a reload.

use indexmap::IndexMap;

use crate::types::{GraphEdge, GraphNode};

#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<String, GraphNode>,
    edges: IndexMap<String, GraphEdge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` (and leaves the store untouched) when a
    /// node with the same ID already exists.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Add an edge, idempotent on ID collision like [`add_node`](Self::add_node).
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if self.edges.contains_key(&edge.id) {
            return false;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Iterate edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphEdge, GraphNode, Lang, Reason, SymbolKind};

    fn sample_symbol() -> GraphNode {
        GraphNode::symbol(
            SymbolKind::Function,
            "foo",
            "src/b.ts",
            1,
            1,
            true,
            Lang::TypeScript,
            None,
        )
    }

    #[test]
    fn test_add_node_idempotent() {
        let mut store = GraphStore::new();
        assert!(store.add_node(sample_symbol()));
        assert!(!store.add_node(sample_symbol()));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_first_write_wins() {
        let mut store = GraphStore::new();
        store.add_node(sample_symbol());
        let mut shadow = sample_symbol();
        shadow.name = "renamed".to_string();
        store.add_node(shadow);
        assert_eq!(store.node("function:src/b.ts:foo").unwrap().name, "foo");
    }

    #[test]
    fn test_add_edge_idempotent() {
        let mut store = GraphStore::new();
        let edge = GraphEdge::calls("file:a.ts", "function:src/b.ts:foo", "foo", 0.9, Reason::ImportResolved);
        assert!(store.add_edge(edge.clone()));
        assert!(!store.add_edge(edge));
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = GraphStore::new();
        store.add_node(GraphNode::folder("src"));
        store.add_node(GraphNode::file("src/a.ts", Some(Lang::TypeScript)));
        store.add_node(sample_symbol());
        let ids: Vec<_> = store.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["folder:src", "file:src/a.ts", "function:src/b.ts:foo"]);
    }
}

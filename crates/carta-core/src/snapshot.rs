//! Graph snapshot codec.
//!
//! Serializes the store to JSON and back. Node and edge order is the
//! store's insertion order, so serialize → deserialize → serialize is
//! byte-stable and re-ingesting identical input produces an identical
//! snapshot.

use serde::{Deserialize, Serialize};

use crate::store::GraphStore;
use crate::types::{GraphEdge, GraphError, GraphNode};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Serialize the store to a JSON snapshot string.
pub fn save(store: &GraphStore) -> Result<String, GraphError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        nodes: store.nodes().cloned().collect(),
        edges: store.edges().cloned().collect(),
    };
    serde_json::to_string(&snapshot).map_err(|e| GraphError::Snapshot(e.to_string()))
}

/// Rebuild a store from a snapshot produced by [`save`].
pub fn load(data: &str) -> Result<GraphStore, GraphError> {
    let snapshot: Snapshot =
        serde_json::from_str(data).map_err(|e| GraphError::Snapshot(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(GraphError::Snapshot(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    let mut store = GraphStore::new();
    for node in snapshot.nodes {
        store.add_node(node);
    }
    for edge in snapshot.edges {
        store.add_edge(edge);
    }
    Ok(store)
}

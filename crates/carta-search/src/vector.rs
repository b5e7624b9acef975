//! Vector table and approximate-NN index over graph entities.
//!
//! Embeddable entities are File nodes (first 10 000 characters of content)
//! and Class/Function/Interface/Method symbols (their stored source window).
//! Texts are encoded in fixed-size batches, in order; the HNSW
//! cosine-distance index is built only after every vector is stored.

use std::collections::HashMap;

use carta_core::{GraphStore, NodeData, SymbolKind};
use hnsw_rs::prelude::{DistCosine, Hnsw};

use crate::encoder::TextEncoder;
use crate::SearchError;

pub const DEFAULT_BATCH_SIZE: usize = 16;
pub const DEFAULT_MAX_DISTANCE: f32 = 0.5;

const FILE_CONTENT_CAP: usize = 10_000;
const HNSW_MAX_CONNECTIONS: usize = 16;
const HNSW_MAX_LAYERS: usize = 16;
const HNSW_EF_CONSTRUCTION: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub node_id: String,
    pub name: String,
    pub kind: String,
    pub file_path: String,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub distance: f32,
}

struct VectorEntry {
    node_id: String,
    name: String,
    kind: String,
    file_path: String,
    start_line: Option<u32>,
    end_line: Option<u32>,
    vector: Vec<f32>,
}

pub struct VectorIndex {
    entries: Vec<VectorEntry>,
    hnsw: Hnsw<'static, f32, DistCosine>,
}

fn is_embeddable_symbol(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Class | SymbolKind::Function | SymbolKind::Interface | SymbolKind::Method
    )
}

/// The text representation an entity is embedded from, if it has one.
fn embeddable_text(
    node: &carta_core::GraphNode,
    contents: &HashMap<String, String>,
) -> Option<String> {
    match &node.data {
        NodeData::File { .. } => {
            let content = contents.get(&node.file_path)?;
            let mut text: String = content.chars().take(FILE_CONTENT_CAP).collect();
            if text.trim().is_empty() {
                return None;
            }
            text.shrink_to_fit();
            Some(text)
        }
        NodeData::Symbol {
            symbol, content, ..
        } if is_embeddable_symbol(*symbol) => {
            let text = content.as_deref()?.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        _ => None,
    }
}

impl VectorIndex {
    pub fn build(
        graph: &GraphStore,
        contents: &HashMap<String, String>,
        encoder: &mut dyn TextEncoder,
        batch_size: usize,
    ) -> Result<Self, SearchError> {
        Self::build_with_progress(graph, contents, encoder, batch_size, &mut |_, _| {})
    }

    /// Like [`build`](Self::build), reporting `(items_encoded, items_total)`
    /// after every batch so callers can publish progress between batches.
    pub fn build_with_progress(
        graph: &GraphStore,
        contents: &HashMap<String, String>,
        encoder: &mut dyn TextEncoder,
        batch_size: usize,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Self, SearchError> {
        let batch_size = batch_size.max(1);

        let mut pending: Vec<(VectorEntry, String)> = Vec::new();
        for node in graph.nodes() {
            let Some(text) = embeddable_text(node, contents) else {
                continue;
            };
            let (start_line, end_line) = match node.line_range() {
                Some((start, end)) => (Some(start), Some(end)),
                None => (None, None),
            };
            pending.push((
                VectorEntry {
                    node_id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind_str().to_string(),
                    file_path: node.file_path.clone(),
                    start_line,
                    end_line,
                    vector: Vec::new(),
                },
                text,
            ));
        }

        // Batches processed strictly in order.
        let texts: Vec<String> = pending.iter().map(|(_, text)| text.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            let batch = encoder.encode_batch(chunk)?;
            if batch.len() != chunk.len() {
                return Err(SearchError::Encoder(format!(
                    "encoder returned {} vectors for a batch of {}",
                    batch.len(),
                    chunk.len()
                )));
            }
            vectors.extend(batch);
            progress(vectors.len(), texts.len());
        }

        let entries: Vec<VectorEntry> = pending
            .into_iter()
            .zip(vectors)
            .filter(|(_, vector)| vector.iter().any(|v| *v != 0.0))
            .map(|((mut entry, _), vector)| {
                entry.vector = vector;
                entry
            })
            .collect();

        // ANN index built after all vectors are stored.
        let hnsw = Hnsw::new(
            HNSW_MAX_CONNECTIONS,
            entries.len().max(1),
            HNSW_MAX_LAYERS,
            HNSW_EF_CONSTRUCTION,
            DistCosine {},
        );
        for (position, entry) in entries.iter().enumerate() {
            hnsw.insert((entry.vector.as_slice(), position));
        }

        Ok(VectorIndex { entries, hnsw })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-`k` nearest entities by cosine distance; entries beyond
    /// `max_distance` are filtered out.
    pub fn search(&self, query: &[f32], k: usize, max_distance: f32) -> Vec<VectorHit> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }
        let ef_search = (2 * k).max(50);
        let neighbours = self.hnsw.search(query, k.min(self.entries.len()), ef_search);

        let mut hits: Vec<VectorHit> = neighbours
            .into_iter()
            .filter(|n| n.distance <= max_distance)
            .filter_map(|n| {
                let entry = self.entries.get(n.d_id)?;
                Some(VectorHit {
                    node_id: entry.node_id.clone(),
                    name: entry.name.clone(),
                    kind: entry.kind.clone(),
                    file_path: entry.file_path.clone(),
                    start_line: entry.start_line,
                    end_line: entry.end_line,
                    distance: n.distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits
    }

    /// Encode the query text and search.
    pub fn search_text(
        &self,
        query: &str,
        k: usize,
        max_distance: f32,
        encoder: &mut dyn TextEncoder,
    ) -> Result<Vec<VectorHit>, SearchError> {
        let vectors = encoder.encode_batch(&[query.to_string()])?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Encoder("empty query embedding".to_string()))?;
        Ok(self.search(&query_vec, k, max_distance))
    }
}

//! Hybrid retrieval: reciprocal rank fusion of lexical and vector hits.
//!
//! Both sources are asked for `oversample × k` results; each contributes
//! `1 / (K + rank + 1)` (0-indexed ranks, K = 60) per hit. Hits carry the
//! set of contributing sources and the per-source raw scores. When the
//! vector index is absent the retriever degrades to lexical-only and tags
//! hits with source `bm25`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::bm25::Bm25Index;
use crate::encoder::TextEncoder;
use crate::vector::VectorIndex;
use crate::SearchError;

pub const RRF_K: f64 = 60.0;
pub const SOURCE_BM25: &str = "bm25";
pub const SOURCE_SEMANTIC: &str = "semantic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    /// Fused RRF score.
    pub score: f64,
    /// 1-indexed final rank.
    pub rank: usize,
    pub sources: BTreeSet<String>,
    pub raw_scores: BTreeMap<String, f64>,
}

/// One ranked result list from a single source.
pub struct RankedList {
    pub source: &'static str,
    /// `(key, raw score)` in rank order.
    pub items: Vec<(String, f64)>,
}

/// Fuse ranked lists with reciprocal rank fusion. Within a list only a
/// key's best (first) rank counts. Ties break by path for determinism.
pub fn rrf_fuse(lists: Vec<RankedList>, rrf_k: f64, k: usize) -> Vec<SearchHit> {
    let mut merged: HashMap<String, SearchHit> = HashMap::new();

    for list in lists {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for (rank, (key, raw)) in list.items.into_iter().enumerate() {
            if !seen.insert(key.clone()) {
                continue;
            }
            let contribution = 1.0 / (rrf_k + rank as f64 + 1.0);
            let hit = merged.entry(key.clone()).or_insert_with(|| SearchHit {
                path: key.clone(),
                score: 0.0,
                rank: 0,
                sources: BTreeSet::new(),
                raw_scores: BTreeMap::new(),
            });
            hit.score += contribution;
            hit.sources.insert(list.source.to_string());
            hit.raw_scores.insert(list.source.to_string(), raw);
        }
    }

    let mut hits: Vec<SearchHit> = merged.into_values().collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    hits.truncate(k);
    for (index, hit) in hits.iter_mut().enumerate() {
        hit.rank = index + 1;
    }
    hits
}

/// Retrieval front door over the lexical index and the optional vector
/// substrate.
pub struct HybridRetriever {
    bm25: Bm25Index,
    vector: Option<VectorIndex>,
    encoder: Option<Box<dyn TextEncoder>>,
    rrf_k: f64,
    oversample: usize,
    max_distance: f32,
}

impl HybridRetriever {
    pub fn new(bm25: Bm25Index) -> Self {
        HybridRetriever {
            bm25,
            vector: None,
            encoder: None,
            rrf_k: RRF_K,
            oversample: 3,
            max_distance: crate::vector::DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn with_vector(mut self, vector: VectorIndex, encoder: Box<dyn TextEncoder>) -> Self {
        self.vector = Some(vector);
        self.encoder = Some(encoder);
        self
    }

    pub fn with_tuning(mut self, rrf_k: f64, oversample: usize, max_distance: f32) -> Self {
        self.rrf_k = rrf_k;
        self.oversample = oversample.max(1);
        self.max_distance = max_distance;
        self
    }

    pub fn has_vector_index(&self) -> bool {
        self.vector.is_some()
    }

    pub fn search(&mut self, query: &str, k: usize) -> Result<Vec<SearchHit>, SearchError> {
        let fetch = self.oversample * k;
        let mut lists = Vec::new();

        let lexical = self.bm25.search(query, fetch)?;
        lists.push(RankedList {
            source: SOURCE_BM25,
            items: lexical
                .into_iter()
                .map(|hit| (hit.path, hit.score as f64))
                .collect(),
        });

        if let (Some(vector), Some(encoder)) = (&self.vector, &mut self.encoder) {
            let semantic =
                vector.search_text(query, fetch, self.max_distance, encoder.as_mut())?;
            lists.push(RankedList {
                source: SOURCE_SEMANTIC,
                items: semantic
                    .into_iter()
                    .map(|hit| (hit.file_path, hit.distance as f64))
                    .collect(),
            });
        }

        Ok(rrf_fuse(lists, self.rrf_k, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(source: &'static str, keys: &[&str]) -> RankedList {
        RankedList {
            source,
            items: keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.to_string(), 10.0 - i as f64))
                .collect(),
        }
    }

    #[test]
    fn test_rrf_arithmetic() {
        // Rank 0 lexically, rank 2 semantically: 1/61 + 1/63.
        let lists = vec![
            list(SOURCE_BM25, &["a.ts", "b.ts", "c.ts"]),
            list(SOURCE_SEMANTIC, &["x.ts", "y.ts", "a.ts"]),
        ];
        let hits = rrf_fuse(lists, RRF_K, 10);
        let a = hits.iter().find(|h| h.path == "a.ts").unwrap();
        let expected = 1.0 / 61.0 + 1.0 / 63.0;
        assert!((a.score - expected).abs() < 1e-9);
        assert!((a.score - 0.03228).abs() < 1e-4);
        assert!(a.sources.contains(SOURCE_BM25));
        assert!(a.sources.contains(SOURCE_SEMANTIC));
    }

    #[test]
    fn test_dual_source_hit_outranks_single() {
        let lists = vec![
            list(SOURCE_BM25, &["both.ts", "only-lex.ts"]),
            list(SOURCE_SEMANTIC, &["both.ts", "only-sem.ts"]),
        ];
        let hits = rrf_fuse(lists, RRF_K, 10);
        assert_eq!(hits[0].path, "both.ts");
        assert_eq!(hits[0].rank, 1);
    }

    #[test]
    fn test_ranks_are_one_indexed_and_capped() {
        let lists = vec![list(SOURCE_BM25, &["a", "b", "c", "d"])];
        let hits = rrf_fuse(lists, RRF_K, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].rank, 2);
    }

    #[test]
    fn test_raw_scores_recorded_per_source() {
        let lists = vec![
            RankedList {
                source: SOURCE_BM25,
                items: vec![("a".to_string(), 7.5)],
            },
            RankedList {
                source: SOURCE_SEMANTIC,
                items: vec![("a".to_string(), 0.25)],
            },
        ];
        let hits = rrf_fuse(lists, RRF_K, 10);
        assert_eq!(hits[0].raw_scores[SOURCE_BM25], 7.5);
        assert_eq!(hits[0].raw_scores[SOURCE_SEMANTIC], 0.25);
    }

    #[test]
    fn test_duplicate_keys_within_a_list_keep_best_rank() {
        let lists = vec![RankedList {
            source: SOURCE_SEMANTIC,
            items: vec![
                ("a".to_string(), 0.1),
                ("a".to_string(), 0.4),
                ("b".to_string(), 0.2),
            ],
        }];
        let hits = rrf_fuse(lists, RRF_K, 10);
        let a = hits.iter().find(|h| h.path == "a").unwrap();
        assert!((a.score - 1.0 / 61.0).abs() < 1e-9);
        assert_eq!(a.raw_scores[SOURCE_SEMANTIC], 0.1);
    }

    #[test]
    fn test_lexical_only_fallback_tags_bm25() {
        let mut contents = std::collections::HashMap::new();
        contents.insert("a.ts".to_string(), "login session".to_string());
        let bm25 = Bm25Index::build(&contents).unwrap();
        let mut retriever = HybridRetriever::new(bm25);
        assert!(!retriever.has_vector_index());

        let hits = retriever.search("login", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].sources.iter().collect::<Vec<_>>(),
            vec![SOURCE_BM25]
        );
    }
}

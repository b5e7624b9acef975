//! Retrieval substrates over the carta graph.
//!
//! - [`bm25`] — in-RAM tantivy keyword index over file contents
//! - [`encoder`] — pluggable text encoders (fastembed primary, hashing fallback)
//! - [`vector`] — vector table + HNSW cosine approximate-NN index
//! - [`hybrid`] — reciprocal-rank-fusion retriever over both substrates

pub mod bm25;
pub mod encoder;
pub mod hybrid;
pub mod vector;

pub use bm25::{Bm25Hit, Bm25Index};
pub use encoder::{
    auto_encoder, FastembedEncoder, HashingEncoder, TextEncoder, EMBEDDING_DIMENSION,
};
pub use hybrid::{rrf_fuse, HybridRetriever, RankedList, SearchHit, RRF_K};
pub use vector::{VectorHit, VectorIndex, DEFAULT_BATCH_SIZE, DEFAULT_MAX_DISTANCE};

/// Errors from index construction and querying.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("lexical index error: {0}")]
    Lexical(String),

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("vector index error: {0}")]
    Vector(String),
}

//! Pluggable text encoders.
//!
//! The primary encoder wraps fastembed's AllMiniLM-L6-v2 (384 dimensions,
//! unit-normalized, mean-pooled). When the model cannot initialize — no
//! accelerator, no cached weights, offline environment — a deterministic
//! feature-hashing encoder takes over so the vector path keeps working,
//! just with purely lexical semantics.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use xxhash_rust::xxh64::xxh64;

use crate::SearchError;

pub const EMBEDDING_DIMENSION: usize = 384;

/// Capability trait over anything that can embed a batch of texts.
pub trait TextEncoder: Send {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    /// Encode a batch, preserving input order. Returned vectors are
    /// unit-normalized (or all-zero for empty input texts).
    fn encode_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;
}

/// fastembed-backed encoder.
pub struct FastembedEncoder {
    model: TextEmbedding,
}

impl FastembedEncoder {
    pub fn new() -> Result<Self, SearchError> {
        let options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| SearchError::Encoder(format!("fastembed init failed: {e}")))?;
        Ok(FastembedEncoder { model })
    }
}

impl TextEncoder for FastembedEncoder {
    fn encode_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| SearchError::Encoder(e.to_string()))
    }
}

/// Deterministic CPU fallback: hashed bag-of-words, L2-normalized.
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    pub fn new() -> Self {
        HashingEncoder {
            dimension: EMBEDDING_DIMENSION,
        }
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEncoder for HashingEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dimension];
                for token in tokenize(text) {
                    let bucket = (xxh64(token.as_bytes(), 0) as usize) % self.dimension;
                    vector[bucket] += 1.0;
                }
                normalize(&mut vector);
                vector
            })
            .collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// The primary encoder when available, the hashing fallback otherwise.
pub fn auto_encoder() -> Box<dyn TextEncoder> {
    match FastembedEncoder::new() {
        Ok(encoder) => Box::new(encoder),
        Err(e) => {
            tracing::warn!("falling back to hashing encoder: {e}");
            Box::new(HashingEncoder::new())
        }
    }
}

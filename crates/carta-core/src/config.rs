//! Configuration file loading for carta.
//!
//! Reads `.carta/carta.json` and provides typed access to all settings.
//! Falls back to sensible defaults when the config file is missing or
//! incomplete.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level carta configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartaConfig {
    pub version: String,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Parser pool tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Parsed syntax trees retained between stages.
    #[serde(default = "default_ast_cache_capacity")]
    pub ast_cache_capacity: usize,
}

/// Community detection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Communities below this size are discarded.
    #[serde(default = "default_min_members")]
    pub min_members: usize,
}

/// Trace extraction bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_max_trace_depth")]
    pub max_trace_depth: usize,
    /// Children expanded per node during BFS.
    #[serde(default = "default_max_branching")]
    pub max_branching: usize,
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,
    #[serde(default = "default_min_steps")]
    pub min_steps: usize,
    /// Top-scoring entry points retained as BFS seeds.
    #[serde(default = "default_max_seeds")]
    pub max_seeds: usize,
}

/// Embedding index tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Hits beyond this cosine distance are filtered out.
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
}

/// Hybrid retrieval tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Reciprocal-rank-fusion constant.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,
    /// Each source is asked for `oversample * k` results before fusion.
    #[serde(default = "default_oversample")]
    pub oversample: usize,
}

fn default_ast_cache_capacity() -> usize {
    50
}
fn default_resolution() -> f64 {
    1.0
}
fn default_min_members() -> usize {
    2
}
fn default_max_trace_depth() -> usize {
    10
}
fn default_max_branching() -> usize {
    4
}
fn default_max_processes() -> usize {
    75
}
fn default_min_steps() -> usize {
    2
}
fn default_max_seeds() -> usize {
    200
}
fn default_batch_size() -> usize {
    16
}
fn default_dimension() -> usize {
    384
}
fn default_max_distance() -> f32 {
    0.5
}
fn default_rrf_k() -> f64 {
    60.0
}
fn default_oversample() -> usize {
    3
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            ast_cache_capacity: default_ast_cache_capacity(),
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            min_members: default_min_members(),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_trace_depth: default_max_trace_depth(),
            max_branching: default_max_branching(),
            max_processes: default_max_processes(),
            min_steps: default_min_steps(),
            max_seeds: default_max_seeds(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dimension: default_dimension(),
            max_distance: default_max_distance(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            oversample: default_oversample(),
        }
    }
}

impl Default for CartaConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            ignore_patterns: vec![],
            parser: ParserConfig::default(),
            community: CommunityConfig::default(),
            process: ProcessConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl CartaConfig {
    /// Load configuration from `carta.json` inside the given carta directory.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(carta_dir: &Path) -> Self {
        let config_path = carta_dir.join("carta.json");
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    "failed to parse {}: {}, using defaults",
                    config_path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

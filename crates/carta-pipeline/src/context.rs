//! Per-run pipeline state.

use std::collections::{BTreeSet, HashMap};

use carta_core::{GraphStore, Lang, SymbolTable};
use carta_parsers::ParserPool;

/// One input file, `/`-separated and rooted relative to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        FileEntry {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Everything the stages share within a single pipeline run. Created by the
/// orchestrator per run and dropped with it.
pub struct PipelineContext {
    pub store: GraphStore,
    pub symbols: SymbolTable,
    pub pool: ParserPool,
    /// Accepted input files, in input order, paths normalized.
    pub files: Vec<FileEntry>,
    /// Language per accepted file (unknown-language files are absent).
    pub languages: HashMap<String, Lang>,
    /// file path -> set of project file paths it imports (resolved).
    pub import_map: HashMap<String, BTreeSet<String>>,
}

impl PipelineContext {
    pub fn new(ast_cache_capacity: usize) -> Self {
        PipelineContext {
            store: GraphStore::new(),
            symbols: SymbolTable::new(),
            pool: ParserPool::new(ast_cache_capacity),
            files: Vec::new(),
            languages: HashMap::new(),
            import_map: HashMap::new(),
        }
    }
}

//! Parser pool with a bounded AST cache.
//!
//! One `tree_sitter::Parser` is reused across languages; grammars and
//! compiled query sets load lazily on first use. Parsed trees are retained
//! in an LRU cache so the import, call, and heritage passes can revisit a
//! file without reparsing it; evicted files are simply reparsed on demand.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use carta_core::Lang;
use lru::LruCache;
use tree_sitter::{Parser, Query, Tree};

use crate::lang::grammar;
use crate::queries;

pub const DEFAULT_AST_CACHE_CAPACITY: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("language error: {0}")]
    Language(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("parse failed")]
    ParseFailed,
}

pub struct ParserPool {
    parser: Parser,
    queries: HashMap<Lang, Arc<Query>>,
    trees: LruCache<String, Tree>,
}

impl ParserPool {
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity.max(1)).expect("capacity >= 1");
        ParserPool {
            parser: Parser::new(),
            queries: HashMap::new(),
            trees: LruCache::new(capacity),
        }
    }

    /// Parse `content`, or return the cached tree for `path`. The returned
    /// tree is a cheap handle onto shared state.
    pub fn parse(&mut self, path: &str, lang: Lang, content: &str) -> Result<Tree, ParseError> {
        if let Some(tree) = self.trees.get(path) {
            return Ok(tree.clone());
        }
        self.parser
            .set_language(&grammar(lang))
            .map_err(|e| ParseError::Language(e.to_string()))?;
        let tree = self
            .parser
            .parse(content.as_bytes(), None)
            .ok_or(ParseError::ParseFailed)?;
        self.trees.put(path.to_string(), tree.clone());
        Ok(tree)
    }

    /// The compiled query set for `lang`, compiling it on first use.
    pub fn query(&mut self, lang: Lang) -> Result<Arc<Query>, ParseError> {
        if let Some(query) = self.queries.get(&lang) {
            return Ok(Arc::clone(query));
        }
        let query = Arc::new(queries::query_for_language(lang).map_err(ParseError::Query)?);
        self.queries.insert(lang, Arc::clone(&query));
        Ok(query)
    }

    /// Drop all cached trees (queries stay compiled).
    pub fn clear_trees(&mut self) {
        self.trees.clear();
    }

    pub fn cached_tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl std::fmt::Debug for ParserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPool")
            .field("compiled_queries", &self.queries.len())
            .field("cached_trees", &self.trees.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript() {
        let mut pool = ParserPool::new(DEFAULT_AST_CACHE_CAPACITY);
        let tree = pool
            .parse("a.ts", Lang::TypeScript, "export function foo() {}")
            .unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_cache_hit_avoids_reparse() {
        let mut pool = ParserPool::new(2);
        pool.parse("a.py", Lang::Python, "def f(): pass").unwrap();
        assert_eq!(pool.cached_tree_count(), 1);
        pool.parse("a.py", Lang::Python, "def f(): pass").unwrap();
        assert_eq!(pool.cached_tree_count(), 1);
    }

    #[test]
    fn test_cache_eviction_is_bounded() {
        let mut pool = ParserPool::new(2);
        pool.parse("a.py", Lang::Python, "def a(): pass").unwrap();
        pool.parse("b.py", Lang::Python, "def b(): pass").unwrap();
        pool.parse("c.py", Lang::Python, "def c(): pass").unwrap();
        assert_eq!(pool.cached_tree_count(), 2);
    }

    #[test]
    fn test_all_query_sets_compile() {
        let mut pool = ParserPool::new(1);
        for lang in [
            Lang::TypeScript,
            Lang::Tsx,
            Lang::JavaScript,
            Lang::Python,
            Lang::Java,
            Lang::C,
            Lang::Cpp,
            Lang::CSharp,
            Lang::Go,
            Lang::Rust,
        ] {
            pool.query(lang)
                .unwrap_or_else(|e| panic!("query for {lang} failed: {e}"));
        }
    }
}

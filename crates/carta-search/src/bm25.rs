//! Keyword index over file contents.
//!
//! An in-RAM tantivy index with a two-field schema: the stored path and the
//! tokenized content. Scores are tantivy's BM25. Built synchronously from
//! the pipeline's file-content map.

use std::collections::HashMap;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, TantivyDocument};

use crate::SearchError;

const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Bm25Hit {
    pub path: String,
    pub score: f32,
}

pub struct Bm25Index {
    index: Index,
    path_field: Field,
    content_field: Field,
}

impl Bm25Index {
    /// Index every file's content. Files are fed in path order so repeated
    /// builds produce identical indexes.
    pub fn build(contents: &HashMap<String, String>) -> Result<Self, SearchError> {
        let mut schema_builder = Schema::builder();
        let path_field = schema_builder.add_text_field("path", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let mut writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| SearchError::Lexical(e.to_string()))?;

        let mut paths: Vec<&String> = contents.keys().collect();
        paths.sort();
        for path in paths {
            writer
                .add_document(doc!(
                    path_field => path.as_str(),
                    content_field => contents[path].as_str(),
                ))
                .map_err(|e| SearchError::Lexical(e.to_string()))?;
        }
        writer
            .commit()
            .map_err(|e| SearchError::Lexical(e.to_string()))?;

        Ok(Bm25Index {
            index,
            path_field,
            content_field,
        })
    }

    /// Top-`k` files by BM25 score, descending.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Bm25Hit>, SearchError> {
        let sanitized = sanitize_query(query);
        if sanitized.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let reader = self
            .index
            .reader()
            .map_err(|e| SearchError::Lexical(e.to_string()))?;
        let searcher = reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let parsed = parser
            .parse_query(&sanitized)
            .map_err(|e| SearchError::Lexical(e.to_string()))?;

        let top = searcher
            .search(&parsed, &TopDocs::with_limit(k))
            .map_err(|e| SearchError::Lexical(e.to_string()))?;

        let mut hits = Vec::with_capacity(top.len());
        for (score, address) in top {
            let document: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::Lexical(e.to_string()))?;
            let Some(path) = document
                .get_first(self.path_field)
                .and_then(|v| v.as_str())
            else {
                continue;
            };
            hits.push(Bm25Hit {
                path: path.to_string(),
                score,
            });
        }
        Ok(hits)
    }
}

/// Query strings pass through the tantivy parser; strip its operator
/// syntax so arbitrary user text cannot fail to parse.
fn sanitize_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

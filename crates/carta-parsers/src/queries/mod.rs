//! Per-language tree-sitter query sets.
//!
//! Capture names follow a fixed convention the extraction layer dispatches
//! on: `@definition.<kind>` paired with `@name`, `@import` with
//! `@import.source`, `@call` with `@call.name`, and `@heritage.class` /
//! `@heritage.extends` / `@heritage.implements` / `@heritage.trait`.

use carta_core::Lang;
use tree_sitter::Query;

pub const TYPESCRIPT_QUERIES: &str = include_str!("typescript.scm");
pub const JAVASCRIPT_QUERIES: &str = include_str!("javascript.scm");
pub const PYTHON_QUERIES: &str = include_str!("python.scm");
pub const JAVA_QUERIES: &str = include_str!("java.scm");
pub const C_QUERIES: &str = include_str!("c.scm");
pub const CPP_QUERIES: &str = include_str!("cpp.scm");
pub const CSHARP_QUERIES: &str = include_str!("csharp.scm");
pub const GO_QUERIES: &str = include_str!("go.scm");
pub const RUST_QUERIES: &str = include_str!("rust.scm");

pub fn query_source(lang: Lang) -> &'static str {
    match lang {
        Lang::TypeScript | Lang::Tsx => TYPESCRIPT_QUERIES,
        Lang::JavaScript => JAVASCRIPT_QUERIES,
        Lang::Python => PYTHON_QUERIES,
        Lang::Java => JAVA_QUERIES,
        Lang::C => C_QUERIES,
        Lang::Cpp => CPP_QUERIES,
        Lang::CSharp => CSHARP_QUERIES,
        Lang::Go => GO_QUERIES,
        Lang::Rust => RUST_QUERIES,
    }
}

/// Compiles the query set for a language against its grammar.
pub fn query_for_language(lang: Lang) -> Result<Query, String> {
    let grammar = crate::lang::grammar(lang);
    Query::new(&grammar, query_source(lang))
        .map_err(|e| format!("query compilation error for {lang}: {e}"))
}

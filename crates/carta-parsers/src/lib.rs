//! Tree-sitter parsing, query sets, and path filtering for carta.
//!
//! - [`lang`] — language detection and grammar loading
//! - [`queries`] — per-language capture sets (`.scm`)
//! - [`pool`] — the [`ParserPool`](pool::ParserPool) with its bounded AST cache
//! - [`extract`] — decoding query matches into definition/import/call/heritage records
//! - [`visibility`] — per-language export rules
//! - [`ignore_filter`] — build/vendor/binary path exclusion
//! - [`walker`] — filesystem front-end feeding the pipeline

pub mod extract;
pub mod ignore_filter;
pub mod lang;
pub mod pool;
pub mod queries;
pub mod visibility;
pub mod walker;

pub use extract::{
    CallRef, Caller, Definition, HeritageRef, HeritageRelation, ImportRef,
};
pub use ignore_filter::IgnoreFilter;
pub use lang::detect_language;
pub use pool::{ParseError, ParserPool, DEFAULT_AST_CACHE_CAPACITY};
pub use walker::FileWalker;

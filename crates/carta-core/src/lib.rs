//! Core types, graph storage, and configuration for carta.
//!
//! This crate provides the foundational data structures used across all
//! carta crates:
//! - [`types`] — Graph nodes, edges, and error types
//! - [`ids`] — Deterministic node/edge identifier scheme
//! - [`store`] — The in-memory, idempotent [`GraphStore`](store::GraphStore)
//! - [`symbols`] — Two-level definition index for resolution
//! - [`config`] — Configuration loading from `.carta/carta.json`
//! - [`snapshot`] — JSON snapshot codec with a round-trip guarantee
//! - [`query`] — Read-only structural queries over the store

pub mod config;
pub mod ids;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod symbols;
pub mod types;

pub use store::GraphStore;
pub use symbols::{SymbolEntry, SymbolTable};
pub use types::{
    EdgeKind, GraphEdge, GraphError, GraphNode, Lang, NodeData, ProcessFlow, Reason, SymbolKind,
};

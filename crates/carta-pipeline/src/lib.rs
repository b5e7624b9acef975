//! Staged ingestion pipeline for carta.
//!
//! The orchestrator drives a fixed sequence over an in-memory graph store:
//! ignore filtering, filesystem structure, definition parsing, import
//! resolution, call resolution, heritage, Louvain communities, and trace
//! extraction. Progress flows through an explicit callback; cancellation is
//! a polled token.

pub mod communities;
pub mod context;
pub mod orchestrator;
pub mod processes;
pub mod progress;
pub mod stages;

pub use communities::{Community, CommunityResult};
pub use context::{FileEntry, PipelineContext};
pub use orchestrator::{AnalysisResult, Pipeline};
pub use processes::{Process, ProcessResult};
pub use progress::{CancelToken, Phase, PipelineError, ProgressEvent, ProgressStats};

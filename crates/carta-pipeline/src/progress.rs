//! Progress events, phase bookkeeping, and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Fixed pipeline phase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Extracting,
    Structure,
    Parsing,
    Imports,
    Calls,
    Heritage,
    Communities,
    Processes,
    Complete,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Extracting => "extracting",
            Phase::Structure => "structure",
            Phase::Parsing => "parsing",
            Phase::Imports => "imports",
            Phase::Calls => "calls",
            Phase::Heritage => "heritage",
            Phase::Communities => "communities",
            Phase::Processes => "processes",
            Phase::Complete => "complete",
            Phase::Error => "error",
        }
    }

    /// Deterministic percent window for each phase.
    pub fn percent_range(&self) -> (f32, f32) {
        match self {
            Phase::Extracting => (0.0, 15.0),
            Phase::Structure => (15.0, 30.0),
            Phase::Parsing => (30.0, 70.0),
            Phase::Imports => (70.0, 82.0),
            Phase::Calls => (82.0, 92.0),
            Phase::Heritage => (88.0, 92.0),
            Phase::Communities => (92.0, 98.0),
            Phase::Processes => (98.0, 99.0),
            Phase::Complete => (100.0, 100.0),
            Phase::Error => (100.0, 100.0),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub files_processed: usize,
    pub total_files: usize,
    pub nodes_created: usize,
}

/// One progress record as delivered to the embedder's callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub percent: f32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ProgressStats>,
}

/// Cooperative cancellation token, polled between phases and files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Pipeline outcome errors. Skip-file issues never surface here; they go
/// through the progress channel as warnings.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline cancelled")]
    Cancelled,

    #[error("{phase} stage failed: {message}")]
    Stage { phase: &'static str, message: String },

    #[error(transparent)]
    Graph(#[from] carta_core::GraphError),
}

/// Per-phase progress reporter handed to stages by the orchestrator.
pub struct Reporter<'a> {
    callback: &'a mut dyn FnMut(ProgressEvent),
    cancel: &'a CancelToken,
    phase: Phase,
}

impl<'a> Reporter<'a> {
    pub fn new(
        callback: &'a mut dyn FnMut(ProgressEvent),
        cancel: &'a CancelToken,
        phase: Phase,
    ) -> Self {
        Reporter {
            callback,
            cancel,
            phase,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Emit an event at `fraction` (0..=1) of this phase's percent window.
    pub fn emit(&mut self, fraction: f32, message: &str, stats: Option<ProgressStats>) {
        let (lo, hi) = self.phase.percent_range();
        let percent = lo + (hi - lo) * fraction.clamp(0.0, 1.0);
        (self.callback)(ProgressEvent {
            phase: self.phase,
            percent,
            message: message.to_string(),
            detail: None,
            stats,
        });
    }

    /// Surface a skip-file warning without interrupting the stage.
    pub fn warn(&mut self, message: &str, detail: &str) {
        tracing::warn!("{message}: {detail}");
        let (lo, _) = self.phase.percent_range();
        (self.callback)(ProgressEvent {
            phase: self.phase,
            percent: lo,
            message: message.to_string(),
            detail: Some(detail.to_string()),
            stats: None,
        });
    }

    pub fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

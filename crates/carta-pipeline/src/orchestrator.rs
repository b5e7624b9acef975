//! Pipeline orchestrator.
//!
//! Owns the graph store, symbol table, AST cache, and import map for one
//! run, drives the fixed phase sequence, and maps failures to the error
//! taxonomy: skip-file issues warn through the progress channel, stage
//! errors surface an `error` phase then return `Err`, cancellation is its
//! own outcome and partial state is discarded.

use std::collections::HashMap;

use carta_core::config::CartaConfig;
use carta_core::GraphStore;
use carta_parsers::IgnoreFilter;

use crate::communities::{self, CommunityResult};
use crate::context::{FileEntry, PipelineContext};
use crate::processes::{self, ProcessResult};
use crate::progress::{
    CancelToken, Phase, PipelineError, ProgressEvent, ProgressStats, Reporter,
};
use crate::stages;

/// Everything a run produces.
pub struct AnalysisResult {
    pub graph: GraphStore,
    pub file_contents: HashMap<String, String>,
    pub communities: CommunityResult,
    pub processes: ProcessResult,
}

pub struct Pipeline {
    config: CartaConfig,
}

impl Pipeline {
    pub fn new(config: CartaConfig) -> Self {
        Pipeline { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CartaConfig::default())
    }

    /// Run the full phase sequence over the input files. `progress`
    /// receives one event stream; `cancel` is polled between phases and
    /// between files.
    pub fn run(
        &self,
        files: Vec<FileEntry>,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<AnalysisResult, PipelineError> {
        match self.run_inner(files, progress, cancel) {
            Ok(result) => Ok(result),
            Err(PipelineError::Cancelled) => Err(PipelineError::Cancelled),
            Err(e) => {
                progress(ProgressEvent {
                    phase: Phase::Error,
                    percent: 100.0,
                    message: e.to_string(),
                    detail: None,
                    stats: None,
                });
                Err(e)
            }
        }
    }

    fn run_inner(
        &self,
        files: Vec<FileEntry>,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<AnalysisResult, PipelineError> {
        let mut ctx = PipelineContext::new(self.config.parser.ast_cache_capacity);

        // -- extracting: accept, normalize, and filter the input set.
        {
            let mut reporter = Reporter::new(progress, cancel, Phase::Extracting);
            reporter.check_cancelled()?;
            let filter = IgnoreFilter::with_patterns(&self.config.ignore_patterns);
            let total = files.len();
            for mut entry in files {
                entry.path = entry.path.replace('\\', "/");
                if !filter.is_ignored(&entry.path) {
                    ctx.files.push(entry);
                }
            }
            reporter.emit(
                1.0,
                "input accepted",
                Some(ProgressStats {
                    files_processed: ctx.files.len(),
                    total_files: total,
                    nodes_created: 0,
                }),
            );
        }

        macro_rules! phase {
            ($phase:expr, $body:expr) => {{
                let mut reporter = Reporter::new(progress, cancel, $phase);
                reporter.check_cancelled()?;
                let outcome = $body(&mut ctx, &mut reporter);
                if outcome.is_err() {
                    // Best-effort cleanup before propagating.
                    ctx.pool.clear_trees();
                }
                outcome
            }};
        }

        phase!(Phase::Structure, stages::structure::run)?;
        phase!(Phase::Parsing, stages::parsing::run)?;
        phase!(Phase::Imports, stages::imports::run)?;
        phase!(Phase::Calls, stages::calls::run)?;
        phase!(Phase::Heritage, stages::heritage::run)?;

        let communities = {
            let mut reporter = Reporter::new(progress, cancel, Phase::Communities);
            reporter.check_cancelled()?;
            communities::run(&mut ctx, &self.config.community, &mut reporter)?
        };
        let processes = {
            let mut reporter = Reporter::new(progress, cancel, Phase::Processes);
            reporter.check_cancelled()?;
            processes::run(&mut ctx, &communities, &self.config.process, &mut reporter)?
        };

        // The AST cache is not needed past the edge stages.
        ctx.pool.clear_trees();

        let file_contents: HashMap<String, String> = ctx
            .files
            .iter()
            .map(|f| (f.path.clone(), f.content.clone()))
            .collect();

        progress(ProgressEvent {
            phase: Phase::Complete,
            percent: 100.0,
            message: "analysis complete".to_string(),
            detail: None,
            stats: Some(ProgressStats {
                files_processed: ctx.files.len(),
                total_files: ctx.files.len(),
                nodes_created: ctx.store.node_count(),
            }),
        });

        Ok(AnalysisResult {
            graph: ctx.store,
            file_contents,
            communities,
            processes,
        })
    }
}

//! Process stage: entry-point scoring and bounded trace extraction.
//!
//! Entry candidates are Function/Method nodes outside test files with at
//! least one outgoing call, scored as
//!
//! ```text
//! score = call_ratio × export_factor × name_factor × framework_factor
//! call_ratio = out_degree / (in_degree + 1)
//! ```
//!
//! The top seeds drive a forward bounded BFS over the CALLS subgraph; the
//! surviving deduplicated traces become Process nodes with 1-indexed
//! STEP_IN_PROCESS membership edges.

pub mod patterns;

use std::collections::{HashMap, VecDeque};

use carta_core::config::ProcessConfig;
use carta_core::{EdgeKind, GraphEdge, GraphNode, NodeData, ProcessFlow};
use serde::{Deserialize, Serialize};

use crate::communities::{title_case, CommunityResult};
use crate::context::PipelineContext;
use crate::processes::patterns::EntryPatterns;
use crate::progress::{PipelineError, Reporter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    pub label: String,
    pub entry_point_id: String,
    pub terminal_id: String,
    pub step_count: u32,
    pub flow: ProcessFlow,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub processes: Vec<Process>,
}

impl ProcessResult {
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn cross_community_count(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.flow == ProcessFlow::CrossCommunity)
            .count()
    }
}

pub fn run(
    ctx: &mut PipelineContext,
    communities: &CommunityResult,
    config: &ProcessConfig,
    reporter: &mut Reporter<'_>,
) -> Result<ProcessResult, PipelineError> {
    reporter.check_cancelled()?;
    reporter.emit(0.0, "scoring entry points", None);

    // CALLS adjacency snapshot; children sorted for deterministic expansion.
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    let mut in_degree: HashMap<String, usize> = HashMap::new();
    for edge in ctx.store.edges() {
        if edge.kind != EdgeKind::Calls {
            continue;
        }
        outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge.target.clone());
        *in_degree.entry(edge.target.clone()).or_insert(0) += 1;
    }
    for children in outgoing.values_mut() {
        children.sort();
        children.dedup();
    }

    let seeds = score_entry_points(ctx, &outgoing, &in_degree, config);

    let mut traces: Vec<Vec<String>> = Vec::new();
    for (index, seed) in seeds.iter().enumerate() {
        if index % 10 == 0 {
            reporter.check_cancelled()?;
            reporter.emit(
                index as f32 / seeds.len().max(1) as f32,
                "extracting traces",
                None,
            );
        }
        traces.extend(extract_traces(seed, &outgoing, config));
    }

    let kept = dedup_traces(traces, config.max_processes);
    let result = build_processes(ctx, kept, communities);
    reporter.emit(1.0, "traces extracted", None);
    Ok(result)
}

fn score_entry_points(
    ctx: &PipelineContext,
    outgoing: &HashMap<String, Vec<String>>,
    in_degree: &HashMap<String, usize>,
    config: &ProcessConfig,
) -> Vec<String> {
    let patterns = EntryPatterns::new();
    let mut scored: Vec<(f64, String)> = Vec::new();

    for node in ctx.store.nodes() {
        let NodeData::Symbol {
            symbol,
            is_exported,
            language,
            ..
        } = &node.data
        else {
            continue;
        };
        if !matches!(
            symbol,
            carta_core::SymbolKind::Function | carta_core::SymbolKind::Method
        ) {
            continue;
        }
        let out = outgoing.get(&node.id).map_or(0, Vec::len);
        if out == 0 || patterns.is_test_file(&node.file_path) {
            continue;
        }
        let inbound = in_degree.get(&node.id).copied().unwrap_or(0);

        let call_ratio = out as f64 / (inbound + 1) as f64;
        let export_factor = if *is_exported { 2.0 } else { 1.0 };
        let name_factor = patterns.name_factor(&node.name, Some(*language));
        let framework_factor = patterns.framework_factor(&node.file_path);
        let score = call_ratio * export_factor * name_factor * framework_factor;
        scored.push((score, node.id.clone()));
    }

    scored.sort_by(|(sa, ia), (sb, ib)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| ia.cmp(ib))
    });
    scored
        .into_iter()
        .take(config.max_seeds)
        .map(|(_, id)| id)
        .collect()
}

/// Forward bounded BFS from one seed. A branch terminates at a leaf, at the
/// depth cap, or on a cycle; the accumulated path is emitted when it has at
/// least `min_steps` members. A single seed emits at most
/// `max_branching × 3` paths.
fn extract_traces(
    seed: &str,
    outgoing: &HashMap<String, Vec<String>>,
    config: &ProcessConfig,
) -> Vec<Vec<String>> {
    let emit_limit = config.max_branching * 3;
    let mut emitted = Vec::new();
    let mut queue: VecDeque<Vec<String>> = VecDeque::new();
    queue.push_back(vec![seed.to_string()]);

    while let Some(path) = queue.pop_front() {
        if emitted.len() >= emit_limit {
            break;
        }
        let current = path.last().expect("paths are never empty");
        let children = outgoing.get(current).map_or(&[] as &[String], Vec::as_slice);

        let at_depth_cap = path.len() >= config.max_trace_depth;
        if children.is_empty() || at_depth_cap {
            if path.len() >= config.min_steps {
                emitted.push(path);
            }
            continue;
        }

        let mut cycle_emitted = false;
        for child in children.iter().take(config.max_branching) {
            if path.contains(child) {
                // Cycle: terminate this branch, emitting the path once.
                if !cycle_emitted && path.len() >= config.min_steps {
                    emitted.push(path.clone());
                    cycle_emitted = true;
                }
                continue;
            }
            let mut extended = path.clone();
            extended.push(child.clone());
            queue.push_back(extended);
        }
    }

    emitted
}

/// Longest-first containment dedup: a trace survives only if no kept
/// trace's serialization contains its own. The longest `max_processes`
/// survivors are retained.
fn dedup_traces(mut traces: Vec<Vec<String>>, max_processes: usize) -> Vec<Vec<String>> {
    traces.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut kept: Vec<(String, Vec<String>)> = Vec::new();
    for trace in traces {
        let serialized = trace.join(" -> ");
        if kept.iter().any(|(existing, _)| existing.contains(&serialized)) {
            continue;
        }
        kept.push((serialized, trace));
        if kept.len() >= max_processes {
            break;
        }
    }
    kept.into_iter().map(|(_, trace)| trace).collect()
}

fn build_processes(
    ctx: &mut PipelineContext,
    traces: Vec<Vec<String>>,
    communities: &CommunityResult,
) -> ProcessResult {
    let mut result = ProcessResult::default();

    for (ordinal, trace) in traces.into_iter().enumerate() {
        let head_id = trace.first().expect("trace has a head").clone();
        let tail_id = trace.last().expect("trace has a tail").clone();
        let head_name = node_name(ctx, &head_id);
        let tail_name = node_name(ctx, &tail_id);

        let touched: std::collections::HashSet<&String> = trace
            .iter()
            .filter_map(|id| communities.assignments.get(id))
            .collect();
        let flow = if touched.len() > 1 {
            ProcessFlow::CrossCommunity
        } else {
            ProcessFlow::IntraCommunity
        };

        let label = format!("{} → {}", title_case(&head_name), title_case(&tail_name));
        let node = GraphNode::process(
            ordinal,
            &label,
            &head_name,
            trace.len() as u32,
            &head_id,
            &tail_id,
            flow,
        );
        let process_id = node.id.clone();
        ctx.store.add_node(node);

        for (position, member_id) in trace.iter().enumerate() {
            ctx.store.add_edge(GraphEdge::step_in_process(
                member_id,
                &process_id,
                position as u32 + 1,
            ));
        }

        result.processes.push(Process {
            id: process_id,
            label,
            entry_point_id: head_id,
            terminal_id: tail_id,
            step_count: trace.len() as u32,
            flow,
            member_ids: trace,
        });
    }

    result
}

fn node_name(ctx: &PipelineContext, id: &str) -> String {
    ctx.store
        .node(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| id.to_string())
}

//! Community stage: Louvain clustering of the symbol graph plus labeling.
//!
//! The stage consumes a snapshot of the CALLS/EXTENDS/IMPLEMENTS edges
//! among Function, Class, Method, and Interface nodes as they stand at the
//! end of heritage, emits one Community node per cluster of two or more
//! members, and a MEMBER_OF edge for every member. Singletons are
//! discarded.

pub mod louvain;

use std::collections::{BTreeMap, HashMap, HashSet};

use carta_core::config::CommunityConfig;
use carta_core::{EdgeKind, GraphEdge, GraphNode, SymbolKind};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::context::PipelineContext;
use crate::progress::{PipelineError, Reporter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub label: String,
    pub cohesion: f64,
    pub member_ids: Vec<String>,
}

impl Community {
    pub fn symbol_count(&self) -> usize {
        self.member_ids.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Ordered by member count descending.
    pub communities: Vec<Community>,
    /// member node ID -> community ID.
    pub assignments: HashMap<String, String>,
}

impl CommunityResult {
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    pub fn clustered_symbol_count(&self) -> usize {
        self.assignments.len()
    }
}

/// Node kinds that participate in the symbol graph.
fn is_clusterable(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Function | SymbolKind::Class | SymbolKind::Method | SymbolKind::Interface
    )
}

pub fn run(
    ctx: &mut PipelineContext,
    config: &CommunityConfig,
    reporter: &mut Reporter<'_>,
) -> Result<CommunityResult, PipelineError> {
    reporter.check_cancelled()?;
    reporter.emit(0.0, "detecting communities", None);

    // Snapshot: undirected symbol graph with parallel edges merged.
    let mut graph: UnGraph<String, f64> = UnGraph::new_undirected();
    let mut indices: HashMap<String, NodeIndex> = HashMap::new();
    for node in ctx.store.nodes() {
        if node.symbol_kind().is_some_and(is_clusterable) {
            let index = graph.add_node(node.id.clone());
            indices.insert(node.id.clone(), index);
        }
    }
    let mut pair_weights: BTreeMap<(NodeIndex, NodeIndex), f64> = BTreeMap::new();
    for edge in ctx.store.edges() {
        if !matches!(
            edge.kind,
            EdgeKind::Calls | EdgeKind::Extends | EdgeKind::Implements
        ) {
            continue;
        }
        let (Some(&a), Some(&b)) = (indices.get(&edge.source), indices.get(&edge.target)) else {
            continue;
        };
        if a == b {
            continue;
        }
        let key = (a.min(b), a.max(b));
        *pair_weights.entry(key).or_insert(0.0) += 1.0;
    }
    for (&(a, b), &weight) in &pair_weights {
        graph.add_edge(a, b, weight);
    }

    let mut groups = louvain::louvain(&graph, config.resolution);
    groups.retain(|members| members.len() >= config.min_members);
    // Largest first; ties by smallest member ID for determinism.
    groups.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| graph[a[0]].cmp(&graph[b[0]]))
    });

    reporter.check_cancelled()?;

    let mut result = CommunityResult::default();
    for (index, members) in groups.iter().enumerate() {
        let member_ids: Vec<String> = members.iter().map(|&m| graph[m].clone()).collect();
        let member_nodes: Vec<&GraphNode> = member_ids
            .iter()
            .filter_map(|id| ctx.store.node(id))
            .collect();
        let label = derive_label(&member_nodes, index);
        let cohesion = density(members, &pair_weights);

        let community =
            GraphNode::community(index, &label, member_ids.len() as u32, cohesion);
        let community_id = community.id.clone();
        ctx.store.add_node(community);
        for member_id in &member_ids {
            ctx.store
                .add_edge(GraphEdge::member_of(member_id, &community_id));
            result
                .assignments
                .insert(member_id.clone(), community_id.clone());
        }
        result.communities.push(Community {
            id: community_id,
            label,
            cohesion,
            member_ids,
        });

        reporter.emit(
            (index + 1) as f32 / groups.len().max(1) as f32,
            "labeling communities",
            None,
        );
    }

    Ok(result)
}

/// Internal edge density: pairs actually connected over possible pairs.
/// A singleton's density is defined as 1.0.
fn density(members: &[NodeIndex], pair_weights: &BTreeMap<(NodeIndex, NodeIndex), f64>) -> f64 {
    let n = members.len();
    if n <= 1 {
        return 1.0;
    }
    let member_set: HashSet<NodeIndex> = members.iter().copied().collect();
    let internal = pair_weights
        .keys()
        .filter(|(a, b)| member_set.contains(a) && member_set.contains(b))
        .count();
    let possible = n * (n - 1) / 2;
    internal as f64 / possible as f64
}

/// Directories too generic to name a community after.
const GENERIC_DIRS: &[&str] = &["src", "lib", "core", "utils", "common", "shared", "helpers"];

fn derive_label(members: &[&GraphNode], index: usize) -> String {
    // (a) Most frequent non-generic parent directory.
    let mut dir_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in members {
        let Some((dir, _)) = node.file_path.rsplit_once('/') else {
            continue;
        };
        let parent = dir.rsplit('/').next().unwrap_or(dir);
        if parent.is_empty() || GENERIC_DIRS.contains(&parent) {
            continue;
        }
        *dir_counts.entry(parent).or_insert(0) += 1;
    }
    let best_dir = dir_counts
        .iter()
        .map(|(dir, count)| (*count, std::cmp::Reverse(*dir)))
        .max();
    if let Some((_, std::cmp::Reverse(dir))) = best_dir {
        return title_case(dir);
    }

    // (b) Longest common prefix of member names.
    let names: Vec<&str> = members.iter().map(|n| n.name.as_str()).collect();
    let prefix = common_prefix(&names);
    let prefix = prefix.trim_end_matches('_');
    if prefix.len() >= 3 {
        return title_case(prefix);
    }

    // (c) Positional fallback.
    format!("Cluster_{index}")
}

fn common_prefix(names: &[&str]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut prefix = first.to_string();
    for name in &names[1..] {
        let shared = prefix
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(
            prefix
                .char_indices()
                .nth(shared)
                .map_or(prefix.len(), |(i, _)| i),
        );
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

pub(crate) fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

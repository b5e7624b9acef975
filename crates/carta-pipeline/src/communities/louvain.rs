//! Louvain modularity optimization.
//!
//! Classic two-phase scheme: greedy local moves until modularity stops
//! improving, then community aggregation, repeated until a fixed point.
//! Iteration order is node-index order and ties break toward the lowest
//! community index, so results are deterministic for a given graph.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

const EPSILON: f64 = 1e-9;

/// Partition the graph's nodes into communities. Every node appears in
/// exactly one returned group; groups are ordered by their smallest member
/// index.
pub fn louvain<N>(graph: &UnGraph<N, f64>, resolution: f64) -> Vec<Vec<NodeIndex>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut self_weight = vec![0.0f64; n];
    for edge in graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        let w = *edge.weight();
        if a == b {
            self_weight[a] += w;
        } else {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }
    }

    // Which super-node each original node currently belongs to.
    let mut node_group: Vec<usize> = (0..n).collect();

    loop {
        let (assignment, improved) = one_level(&adjacency, &self_weight, resolution);
        if !improved {
            break;
        }
        for group in node_group.iter_mut() {
            *group = assignment[*group];
        }
        let group_count = assignment.iter().max().map_or(0, |m| m + 1);
        if group_count == adjacency.len() {
            break; // nothing merged
        }
        let (next_adjacency, next_self) =
            aggregate(&adjacency, &self_weight, &assignment, group_count);
        adjacency = next_adjacency;
        self_weight = next_self;
    }

    let mut groups: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
    for (node, group) in node_group.iter().enumerate() {
        groups.entry(*group).or_default().push(NodeIndex::new(node));
    }
    let mut result: Vec<Vec<NodeIndex>> = groups.into_values().collect();
    result.sort_by_key(|members| members[0].index());
    result
}

/// One round of greedy local moves. Returns the renumbered community
/// assignment and whether any node moved.
fn one_level(
    adjacency: &[Vec<(usize, f64)>],
    self_weight: &[f64],
    resolution: f64,
) -> (Vec<usize>, bool) {
    let n = adjacency.len();
    let mut community: Vec<usize> = (0..n).collect();

    let degree: Vec<f64> = (0..n)
        .map(|i| adjacency[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self_weight[i])
        .collect();
    let two_m: f64 = degree.iter().sum();
    if two_m <= 0.0 {
        return (community, false);
    }

    // Total degree per community.
    let mut tot = degree.clone();
    let mut improved_any = false;

    loop {
        let mut moved = false;
        for i in 0..n {
            let current = community[i];

            let mut neighbor_weights: HashMap<usize, f64> = HashMap::new();
            for &(j, w) in &adjacency[i] {
                *neighbor_weights.entry(community[j]).or_insert(0.0) += w;
            }

            tot[current] -= degree[i];
            let current_links = neighbor_weights.get(&current).copied().unwrap_or(0.0);
            let mut best = current;
            let mut best_gain = current_links - resolution * tot[current] * degree[i] / two_m;

            let mut candidates: Vec<usize> = neighbor_weights.keys().copied().collect();
            candidates.sort_unstable();
            for candidate in candidates {
                if candidate == current {
                    continue;
                }
                let gain = neighbor_weights[&candidate]
                    - resolution * tot[candidate] * degree[i] / two_m;
                if gain > best_gain + EPSILON {
                    best = candidate;
                    best_gain = gain;
                }
            }

            tot[best] += degree[i];
            if best != current {
                community[i] = best;
                moved = true;
                improved_any = true;
            }
        }
        if !moved {
            break;
        }
    }

    // Renumber to 0..k in first-appearance order.
    let mut renumber: HashMap<usize, usize> = HashMap::new();
    let assignment: Vec<usize> = community
        .iter()
        .map(|c| {
            let next = renumber.len();
            *renumber.entry(*c).or_insert(next)
        })
        .collect();
    (assignment, improved_any)
}

/// Collapse communities into super-nodes, summing edge weights. Intra-
/// community weight becomes self-loop weight.
fn aggregate(
    adjacency: &[Vec<(usize, f64)>],
    self_weight: &[f64],
    assignment: &[usize],
    group_count: usize,
) -> (Vec<Vec<(usize, f64)>>, Vec<f64>) {
    let mut pair_weights: HashMap<(usize, usize), f64> = HashMap::new();
    let mut next_self = vec![0.0f64; group_count];

    for (i, weight) in self_weight.iter().enumerate() {
        next_self[assignment[i]] += weight;
    }
    for (i, neighbors) in adjacency.iter().enumerate() {
        for &(j, w) in neighbors {
            if j <= i {
                continue; // each undirected edge once
            }
            let (a, b) = (assignment[i], assignment[j]);
            if a == b {
                next_self[a] += w;
            } else {
                let key = (a.min(b), a.max(b));
                *pair_weights.entry(key).or_insert(0.0) += w;
            }
        }
    }

    let mut next_adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); group_count];
    let mut pairs: Vec<((usize, usize), f64)> = pair_weights.into_iter().collect();
    pairs.sort_by_key(|(key, _)| *key);
    for ((a, b), w) in pairs {
        next_adjacency[a].push((b, w));
        next_adjacency[b].push((a, w));
    }
    (next_adjacency, next_self)
}

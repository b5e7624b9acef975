//! Universal graph invariants, determinism, and snapshot round-trips,
//! checked over full pipeline runs.

mod common;

use std::collections::{HashMap, HashSet};

use carta_core::{snapshot, EdgeKind, NodeData, Reason};
use carta_pipeline::Phase;
use common::{entry, run_pipeline, run_pipeline_with_events, sample_project};

#[test]
fn test_every_input_file_has_one_file_node_and_contains_chain() {
    let files = sample_project();
    let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
    let result = run_pipeline(files);

    for path in &paths {
        let file_id = format!("file:{path}");
        let file_nodes: Vec<_> = result
            .graph
            .nodes()
            .filter(|n| matches!(n.data, NodeData::File { .. }) && n.file_path == *path)
            .collect();
        assert_eq!(file_nodes.len(), 1, "exactly one File node for {path}");

        // Walk CONTAINS edges upward to the root ancestor.
        let mut current = file_id;
        let mut hops = 0;
        loop {
            let parent = result
                .graph
                .edges()
                .find(|e| e.kind == EdgeKind::Contains && e.target == current)
                .map(|e| e.source.clone());
            match parent {
                Some(p) => {
                    current = p;
                    hops += 1;
                    assert!(hops < 32, "containment chain terminates");
                }
                None => break,
            }
        }
        let expected_hops = path.matches('/').count();
        assert_eq!(hops, expected_hops, "CONTAINS chain covers every prefix of {path}");
    }
}

#[test]
fn test_every_parsed_symbol_has_exactly_one_defines_edge() {
    let result = run_pipeline(sample_project());
    for node in result.graph.nodes() {
        let NodeData::Symbol { start_line, .. } = &node.data else {
            continue;
        };
        if *start_line == 0 {
            continue; // heritage placeholder, not a parsed definition
        }
        let defines: Vec<_> = result
            .graph
            .edges()
            .filter(|e| e.kind == EdgeKind::Defines && e.target == node.id)
            .collect();
        assert_eq!(defines.len(), 1, "one DEFINES edge for {}", node.id);
        assert_eq!(
            defines[0].source,
            format!("file:{}", node.file_path),
            "DEFINES source file matches the symbol's file_path"
        );
    }
}

#[test]
fn test_calls_confidence_and_reason_bands() {
    let result = run_pipeline(sample_project());
    let mut seen_calls = 0;
    for edge in result.graph.edges() {
        if edge.kind != EdgeKind::Calls {
            continue;
        }
        seen_calls += 1;
        assert!(
            [0.3, 0.5, 0.85, 0.9].contains(&edge.confidence),
            "call confidence {} is one of the tier values",
            edge.confidence
        );
        assert!(matches!(
            edge.reason,
            Reason::ImportResolved | Reason::SameFile | Reason::FuzzyGlobal
        ));
    }
    assert!(seen_calls >= 2, "sample project produces call edges");
}

#[test]
fn test_community_membership_edges_are_unique_per_member() {
    let result = run_pipeline(sample_project());
    for community in &result.communities.communities {
        assert!(community.symbol_count() >= 2);
        assert!((0.0..=1.0).contains(&community.cohesion));
        for member in &community.member_ids {
            let count = result
                .graph
                .edges()
                .filter(|e| e.kind == EdgeKind::MemberOf && e.source == *member)
                .count();
            assert_eq!(count, 1, "exactly one MEMBER_OF edge for {member}");
        }
    }
}

#[test]
fn test_process_steps_are_contiguous() {
    let result = run_pipeline(sample_project());
    assert!(!result.processes.processes.is_empty());
    for process in &result.processes.processes {
        let mut steps: Vec<u32> = result
            .graph
            .edges()
            .filter(|e| e.target == process.id)
            .filter_map(|e| e.step())
            .collect();
        steps.sort_unstable();
        let expected: Vec<u32> = (1..=process.step_count).collect();
        assert_eq!(steps, expected, "steps 1..=n for {}", process.id);
    }
}

#[test]
fn test_node_and_edge_ids_are_unique() {
    let result = run_pipeline(sample_project());
    let node_ids: HashSet<_> = result.graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(node_ids.len(), result.graph.node_count());
    let edge_ids: HashSet<_> = result.graph.edges().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids.len(), result.graph.edge_count());
}

#[test]
fn test_rerun_produces_identical_graph() {
    let first = run_pipeline(sample_project());
    let second = run_pipeline(sample_project());

    let nodes_a: Vec<_> = first.graph.nodes().cloned().collect();
    let nodes_b: Vec<_> = second.graph.nodes().cloned().collect();
    assert_eq!(nodes_a, nodes_b);

    let edges_a: Vec<_> = first.graph.edges().cloned().collect();
    let edges_b: Vec<_> = second.graph.edges().cloned().collect();
    assert_eq!(edges_a, edges_b);
}

#[test]
fn test_snapshot_round_trip_over_pipeline_output() {
    let result = run_pipeline(sample_project());
    let saved = snapshot::save(&result.graph).unwrap();
    let restored = snapshot::load(&saved).unwrap();

    let nodes_a: Vec<_> = result.graph.nodes().cloned().collect();
    let nodes_b: Vec<_> = restored.nodes().cloned().collect();
    assert_eq!(nodes_a, nodes_b);

    let resaved = snapshot::save(&restored).unwrap();
    assert_eq!(saved, resaved, "snapshot serialization is byte-stable");
}

#[test]
fn test_file_contents_match_accepted_input() {
    let result = run_pipeline(vec![
        entry("keep.py", "def f(): pass\n"),
        entry("dist/skip.min.js", "var x=1;\n"),
    ]);
    let keys: Vec<_> = result.file_contents.keys().collect();
    assert_eq!(keys, vec!["keep.py"]);
}

#[test]
fn test_progress_events_stay_in_phase_windows() {
    let (_, events) = run_pipeline_with_events(sample_project());
    assert!(!events.is_empty());
    for event in &events {
        assert!((0.0..=100.0).contains(&event.percent));
        let (lo, hi) = event.phase.percent_range();
        assert!(
            event.percent >= lo && event.percent <= hi,
            "{:?} event at {} outside [{lo}, {hi}]",
            event.phase,
            event.percent
        );
    }
    let last = events.last().unwrap();
    assert_eq!(last.phase, Phase::Complete);
    assert_eq!(last.percent, 100.0);
    let stats = last.stats.as_ref().unwrap();
    assert_eq!(stats.files_processed, 4);
    assert!(stats.nodes_created > 0);
}

#[test]
fn test_kind_census_is_stable() {
    let result = run_pipeline(sample_project());
    let mut census: HashMap<&str, usize> = HashMap::new();
    for node in result.graph.nodes() {
        *census.entry(node.kind_str()).or_insert(0) += 1;
    }
    assert_eq!(census["file"], 4);
    assert!(census["folder"] >= 2);
    assert!(census["function"] >= 4);
    assert_eq!(census["class"], 2);
    assert_eq!(census["constructor"], 1);
}

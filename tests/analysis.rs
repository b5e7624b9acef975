//! Community detection and process extraction scenarios.

mod common;

use carta_core::{EdgeKind, NodeData, ProcessFlow};
use common::{entry, run_pipeline};

#[test]
fn test_auth_community_scenario() {
    // Three functions mutually calling each other under src/auth/.
    let result = run_pipeline(vec![
        entry(
            "src/auth/login.ts",
            "import { logout } from './logout';\nexport function login() { logout(); }\n",
        ),
        entry(
            "src/auth/logout.ts",
            "import { session } from './session';\nexport function logout() { session(); }\n",
        ),
        entry(
            "src/auth/session.ts",
            "import { login } from './login';\nexport function session() { login(); }\n",
        ),
    ]);

    assert_eq!(result.communities.community_count(), 1);
    let community = &result.communities.communities[0];
    assert_eq!(community.label, "Auth");
    assert_eq!(community.symbol_count(), 3);
    assert_eq!(community.cohesion, 1.0);

    let community_node = result.graph.node(&community.id).unwrap();
    match &community_node.data {
        NodeData::Community {
            member_count,
            cohesion,
        } => {
            assert_eq!(*member_count, 3);
            assert_eq!(*cohesion, 1.0);
        }
        other => panic!("expected community payload, got {other:?}"),
    }
}

#[test]
fn test_singleton_communities_never_materialize() {
    let result = run_pipeline(vec![entry(
        "solo.py",
        "def isolated(): pass\ndef alone(): pass\n",
    )]);
    assert_eq!(result.communities.community_count(), 0);
    assert!(!result
        .graph
        .nodes()
        .any(|n| matches!(n.data, NodeData::Community { .. })));
}

#[test]
fn test_linear_chain_process_scenario() {
    // main -> a -> b -> c as the only CALLS chain, main exported.
    let result = run_pipeline(vec![entry(
        "src/main.ts",
        "export function main() { a(); }\n\
         function a() { b(); }\n\
         function b() { c(); }\n\
         function c() { return 1; }\n",
    )]);

    assert_eq!(result.processes.process_count(), 1);
    let process = &result.processes.processes[0];
    assert_eq!(process.step_count, 4);
    assert_eq!(process.entry_point_id, "function:src/main.ts:main");
    assert_eq!(process.terminal_id, "function:src/main.ts:c");
    assert_eq!(process.label, "Main → C");

    // Flow agrees with the number of communities the trace touches.
    let touched: std::collections::HashSet<_> = process
        .member_ids
        .iter()
        .filter_map(|m| result.communities.assignments.get(m))
        .collect();
    let expected = if touched.len() > 1 {
        ProcessFlow::CrossCommunity
    } else {
        ProcessFlow::IntraCommunity
    };
    assert_eq!(process.flow, expected);

    // STEP_IN_PROCESS edges carry steps 1..=4 in trace order.
    let mut steps: Vec<(u32, String)> = result
        .graph
        .edges()
        .filter(|e| e.target == process.id)
        .filter_map(|e| e.step().map(|s| (s, e.source.clone())))
        .collect();
    steps.sort();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0], (1, "function:src/main.ts:main".to_string()));
    assert_eq!(steps[3], (4, "function:src/main.ts:c".to_string()));
}

#[test]
fn test_function_without_calls_is_never_an_entry_point() {
    let result = run_pipeline(vec![entry("leaf.py", "def standalone(): pass\n")]);
    assert_eq!(result.processes.process_count(), 0);
}

#[test]
fn test_test_files_are_not_entry_points() {
    let result = run_pipeline(vec![entry(
        "tests/test_app.py",
        "def helper(): pass\ndef test_main(): helper()\n",
    )]);
    assert_eq!(result.processes.process_count(), 0);
}

#[test]
fn test_subtraces_are_deduplicated() {
    // a -> b -> c also yields b -> c from seed b; only the longer survives.
    let result = run_pipeline(vec![entry(
        "chain.py",
        "def a(): b()\ndef b(): c()\ndef c(): pass\n",
    )]);
    assert_eq!(result.processes.process_count(), 1);
    assert_eq!(result.processes.processes[0].step_count, 3);
}

#[test]
fn test_recursive_cycle_still_yields_traces() {
    // Each direction of the cycle terminates on revisit; the two traces
    // are distinct serializations, so both survive dedup.
    let result = run_pipeline(vec![entry(
        "loop.py",
        "def ping(): pong()\ndef pong(): ping()\n",
    )]);
    assert_eq!(result.processes.process_count(), 2);
    assert!(result
        .processes
        .processes
        .iter()
        .all(|p| p.step_count == 2));
}

#[test]
fn test_exported_entry_outranks_internal() {
    let result = run_pipeline(vec![entry(
        "src/srv.py",
        "def serve(): _dispatch()\ndef _dispatch(): _log()\ndef _log(): pass\n",
    )]);
    assert!(result.processes.process_count() >= 1);
    // The exported, entry-named `serve` heads the longest trace.
    assert_eq!(
        result.processes.processes[0].entry_point_id,
        "function:src/srv.py:serve"
    );
}

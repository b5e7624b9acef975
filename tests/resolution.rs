//! End-to-end resolution scenarios: imports, call tiers, and inheritance.

mod common;

use carta_core::{EdgeKind, Reason};
use common::{entry, run_pipeline};

#[test]
fn test_two_file_import() {
    let result = run_pipeline(vec![
        entry("a.ts", "import { foo } from './b';\n"),
        entry("b.ts", "export function foo() {}\n"),
    ]);

    assert!(result.graph.has_node("file:a.ts"));
    assert!(result.graph.has_node("file:b.ts"));
    assert!(result.graph.has_node("function:b.ts:foo"));

    let imports: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Imports)
        .collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].source, "file:a.ts");
    assert_eq!(imports[0].target, "file:b.ts");
    assert_eq!(imports[0].confidence, 1.0);
    assert_eq!(imports[0].reason, Reason::None);

    let defines: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Defines)
        .collect();
    assert_eq!(defines.len(), 1);
    assert_eq!(defines[0].source, "file:b.ts");
    assert_eq!(defines[0].target, "function:b.ts:foo");
}

#[test]
fn test_call_resolution_import_tier() {
    let result = run_pipeline(vec![
        entry(
            "a.ts",
            "import { foo } from './b';\nexport function main() { foo(); }\n",
        ),
        entry("b.ts", "export function foo() {}\n"),
    ]);
    let calls: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Calls)
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].source, "function:a.ts:main");
    assert_eq!(calls[0].target, "function:b.ts:foo");
    assert_eq!(calls[0].confidence, 0.9);
    assert_eq!(calls[0].reason, Reason::ImportResolved);
}

#[test]
fn test_call_resolution_same_file_tier() {
    let result = run_pipeline(vec![entry(
        "x.py",
        "def helper(): pass\ndef main(): helper()\n",
    )]);
    let calls: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Calls)
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].source, "function:x.py:main");
    assert_eq!(calls[0].target, "function:x.py:helper");
    assert_eq!(calls[0].confidence, 0.85);
    assert_eq!(calls[0].reason, Reason::SameFile);
}

#[test]
fn test_call_resolution_fuzzy_tiers() {
    let result = run_pipeline(vec![
        entry("caller.py", "def go(): unique(); ambiguous()\n"),
        entry("m1.py", "def unique(): pass\ndef ambiguous(): pass\n"),
        entry("m2.py", "def ambiguous(): pass\n"),
    ]);
    let calls: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Calls)
        .collect();

    let unique = calls.iter().find(|e| e.target.ends_with(":unique")).unwrap();
    assert_eq!(unique.confidence, 0.5);
    assert_eq!(unique.reason, Reason::FuzzyGlobal);

    let ambiguous = calls
        .iter()
        .find(|e| e.target.ends_with(":ambiguous"))
        .unwrap();
    assert_eq!(ambiguous.confidence, 0.3);
    assert_eq!(ambiguous.reason, Reason::FuzzyGlobal);
    // First definition in insertion order wins.
    assert_eq!(ambiguous.target, "function:m1.py:ambiguous");
}

#[test]
fn test_inheritance_extends() {
    let result = run_pipeline(vec![entry("k.ts", "class A {}\nclass B extends A {}\n")]);
    let extends: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Extends)
        .collect();
    assert_eq!(extends.len(), 1);
    assert_eq!(extends[0].source, "class:k.ts:B");
    assert_eq!(extends[0].target, "class:k.ts:A");
    assert_eq!(extends[0].confidence, 1.0);
}

#[test]
fn test_rust_trait_impl_reason() {
    let result = run_pipeline(vec![entry(
        "s.rs",
        "pub struct Engine;\npub trait Drive { fn go(&self); }\nimpl Drive for Engine { fn go(&self) {} }\n",
    )]);
    let implements: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].source, "impl:s.rs:Engine");
    assert_eq!(implements[0].target, "trait:s.rs:Drive");
    assert_eq!(implements[0].reason, Reason::TraitImpl);
}

// ---------------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------------

#[test]
fn test_file_with_zero_definitions() {
    let result = run_pipeline(vec![entry("empty.ts", "const x = 1;\n")]);
    assert!(result.graph.has_node("file:empty.ts"));
    assert!(!result.graph.edges().any(|e| e.kind == EdgeKind::Defines));
}

#[test]
fn test_wildcard_import_produces_no_edge() {
    let result = run_pipeline(vec![
        entry("Main.java", "import java.util.*;\npublic class Main {}\n"),
        entry("java/util/Maps.java", "public class Maps {}\n"),
    ]);
    assert!(!result.graph.edges().any(|e| e.kind == EdgeKind::Imports));
}

#[test]
fn test_unresolved_import_is_silent() {
    let result = run_pipeline(vec![entry(
        "a.ts",
        "import { x } from 'left-pad';\nexport function f() {}\n",
    )]);
    assert!(!result.graph.edges().any(|e| e.kind == EdgeKind::Imports));
    // The file still parses and defines its symbols.
    assert!(result.graph.has_node("function:a.ts:f"));
}

#[test]
fn test_import_map_feeds_call_tier_over_index_files() {
    let result = run_pipeline(vec![
        entry(
            "src/app.ts",
            "import { boot } from './engine';\nexport function main() { boot(); }\n",
        ),
        entry("src/engine/index.ts", "export function boot() {}\n"),
    ]);
    let calls: Vec<_> = result
        .graph
        .edges()
        .filter(|e| e.kind == EdgeKind::Calls)
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, "function:src/engine/index.ts:boot");
    assert_eq!(calls[0].reason, Reason::ImportResolved);
}

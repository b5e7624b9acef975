//! Call stage: caller attribution and tiered target resolution.
//!
//! Resolution tiers, first hit wins:
//!
//! | tier | condition                                   | confidence | reason          |
//! |------|---------------------------------------------|------------|-----------------|
//! | 1    | name defined in a file the caller imports   | 0.9        | import-resolved |
//! | 2    | name defined in the same file               | 0.85       | same-file       |
//! | 3    | unique global match                         | 0.5        | fuzzy-global    |
//! | 4    | ambiguous global match, first taken         | 0.3        | fuzzy-global    |
//!
//! Unresolvable names are dropped silently. Names in the well-known set
//! (language primitives, ubiquitous standard-library symbols) are skipped
//! before resolution to avoid a combinatorial blowup.

use carta_core::{ids, GraphEdge, Reason};
use carta_parsers::extract;

use crate::context::PipelineContext;
use crate::progress::{PipelineError, ProgressStats, Reporter};

/// Language primitives and ubiquitous stdlib names never worth an edge.
const WELL_KNOWN: &[&str] = &[
    // Console / printing
    "log", "warn", "error", "info", "debug", "trace", "print", "println", "printf", "sprintf",
    "eprintln", "panic", "assert", "require",
    // Collections / iteration
    "map", "filter", "reduce", "forEach", "find", "findIndex", "some", "every", "includes",
    "indexOf", "push", "pop", "shift", "unshift", "slice", "splice", "join", "split", "concat",
    "keys", "values", "entries", "sort", "reverse", "flat", "flatMap", "len", "append", "extend",
    "insert", "remove", "get", "set", "has", "add", "delete", "clear", "contains", "iter",
    "collect", "next", "make", "range", "enumerate", "zip",
    // Conversion / formatting
    "toString", "to_string", "valueOf", "parse", "stringify", "format", "parseInt", "parseFloat",
    "str", "int", "float", "bool", "isinstance", "super", "from", "into", "as_ref", "as_str",
    // Promises / async
    "then", "catch", "finally", "resolve", "reject", "await", "unwrap", "expect", "clone",
    // React hooks
    "useState", "useEffect", "useMemo", "useCallback", "useRef", "useContext", "useReducer",
];

pub fn run(ctx: &mut PipelineContext, reporter: &mut Reporter<'_>) -> Result<(), PipelineError> {
    let total = ctx.files.len();
    let files = std::mem::take(&mut ctx.files);

    let result = (|| {
        for (index, file) in files.iter().enumerate() {
            reporter.check_cancelled()?;
            let Some(&lang) = ctx.languages.get(&file.path) else {
                continue;
            };
            let tree = match ctx.pool.parse(&file.path, lang, &file.content) {
                Ok(t) => t,
                Err(e) => {
                    reporter.warn("parse failed", &format!("{}: {e}", file.path));
                    continue;
                }
            };
            let query = match ctx.pool.query(lang) {
                Ok(q) => q,
                Err(e) => {
                    reporter.warn("query unavailable", &format!("{}: {e}", file.path));
                    continue;
                }
            };

            for call in extract::extract_calls(lang, &query, &tree, file.content.as_bytes()) {
                if WELL_KNOWN.contains(&call.name.as_str()) {
                    continue;
                }
                let caller_id = caller_id(ctx, &file.path, call.caller.as_ref());
                let Some((target_id, confidence, reason)) =
                    resolve_target(ctx, &file.path, &call.name)
                else {
                    continue; // no match anywhere: skip edge
                };
                ctx.store.add_edge(GraphEdge::calls(
                    &caller_id,
                    &target_id,
                    &call.name,
                    confidence,
                    reason,
                ));
            }

            if index % 20 == 0 || index + 1 == total {
                reporter.emit(
                    (index + 1) as f32 / total.max(1) as f32,
                    "resolving calls",
                    Some(ProgressStats {
                        files_processed: index + 1,
                        total_files: total,
                        nodes_created: ctx.store.node_count(),
                    }),
                );
            }
        }
        Ok(())
    })();

    ctx.files = files;
    result
}

/// The caller's graph ID: the enclosing callable via exact lookup, a
/// synthesized symbol ID when the boundary never produced a node, or the
/// enclosing file for top-level calls.
fn caller_id(
    ctx: &PipelineContext,
    file_path: &str,
    caller: Option<&extract::Caller>,
) -> String {
    match caller {
        Some(caller) => match ctx.symbols.lookup_exact(file_path, &caller.name) {
            Some(id) => id.to_string(),
            None => ids::symbol_id(caller.kind, file_path, &caller.name),
        },
        None => ids::file_id(file_path),
    }
}

fn resolve_target(
    ctx: &PipelineContext,
    file_path: &str,
    name: &str,
) -> Option<(String, f64, Reason)> {
    // Tier 1: defined in an imported file.
    if let Some(imports) = ctx.import_map.get(file_path) {
        for imported in imports {
            if let Some(id) = ctx.symbols.lookup_exact(imported, name) {
                return Some((id.to_string(), 0.9, Reason::ImportResolved));
            }
        }
    }
    // Tier 2: defined in the same file.
    if let Some(id) = ctx.symbols.lookup_exact(file_path, name) {
        return Some((id.to_string(), 0.85, Reason::SameFile));
    }
    // Tiers 3/4: global fuzzy.
    let candidates = ctx.symbols.lookup_fuzzy(name);
    match candidates.len() {
        0 => None,
        1 => Some((candidates[0].node_id.clone(), 0.5, Reason::FuzzyGlobal)),
        _ => Some((candidates[0].node_id.clone(), 0.3, Reason::FuzzyGlobal)),
    }
}

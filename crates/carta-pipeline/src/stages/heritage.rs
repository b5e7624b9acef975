//! Heritage stage: EXTENDS / IMPLEMENTS edges from inheritance syntax.
//!
//! The subclass side resolves by exact lookup (else a synthesized node);
//! the base/interface/trait side resolves by fuzzy lookup, first candidate
//! wins, else a placeholder node is materialized so both endpoints exist.
//! Self-loops are rejected. Rust `impl Trait for Type` yields IMPLEMENTS
//! with reason `trait-impl`.

use carta_core::{ids, GraphEdge, GraphNode, Lang, Reason, SymbolKind};
use carta_parsers::extract::{self, HeritageRelation};

use crate::context::PipelineContext;
use crate::progress::{PipelineError, ProgressStats, Reporter};

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

            for heritage in extract::extract_heritage(lang, &query, &tree, file.content.as_bytes())
            {
                add_heritage_edge(ctx, &file.path, lang, &heritage);
            }

            if index % 20 == 0 || index + 1 == total {
                reporter.emit(
                    (index + 1) as f32 / total.max(1) as f32,
                    "linking inheritance",
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

fn add_heritage_edge(
    ctx: &mut PipelineContext,
    file_path: &str,
    lang: Lang,
    heritage: &extract::HeritageRef,
) {
    let source_id = match heritage.relation {
        // The impl node carries the conformance, not the type itself.
        HeritageRelation::TraitImpl => ensure_node(
            ctx,
            SymbolKind::Impl,
            &heritage.class_name,
            file_path,
            lang,
        ),
        _ => match ctx.symbols.lookup_exact(file_path, &heritage.class_name) {
            Some(id) => id.to_string(),
            None => ensure_node(
                ctx,
                SymbolKind::Class,
                &heritage.class_name,
                file_path,
                lang,
            ),
        },
    };

    let target_kind = match heritage.relation {
        HeritageRelation::Extends => SymbolKind::Class,
        HeritageRelation::Implements => SymbolKind::Interface,
        HeritageRelation::TraitImpl => SymbolKind::Trait,
    };
    let candidates = ctx.symbols.lookup_fuzzy(&heritage.target_name);
    let target_id = match candidates.first() {
        Some(entry) => entry.node_id.clone(),
        None => ensure_node(ctx, target_kind, &heritage.target_name, file_path, lang),
    };

    if source_id == target_id {
        return; // self-loop
    }

    let edge = match heritage.relation {
        HeritageRelation::Extends => GraphEdge::extends(&source_id, &target_id),
        HeritageRelation::Implements => {
            GraphEdge::implements(&source_id, &target_id, Reason::None)
        }
        HeritageRelation::TraitImpl => {
            GraphEdge::implements(&source_id, &target_id, Reason::TraitImpl)
        }
    };
    ctx.store.add_edge(edge);
}

/// Returns the ID for `<kind>:<file>:<name>`, materializing a placeholder
/// node when the store does not already have one.
fn ensure_node(
    ctx: &mut PipelineContext,
    kind: SymbolKind,
    name: &str,
    file_path: &str,
    lang: Lang,
) -> String {
    let id = ids::symbol_id(kind, file_path, name);
    if !ctx.store.has_node(&id) {
        ctx.store.add_node(GraphNode::symbol(
            kind, name, file_path, 0, 0, false, lang, None,
        ));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileEntry;
    use crate::progress::{CancelToken, Phase};
    use crate::stages;
    use carta_core::EdgeKind;

    pub(crate) fn run_through_heritage(files: &[(&str, &str)]) -> PipelineContext {
        let mut ctx = PipelineContext::new(8);
        ctx.files = files
            .iter()
            .map(|(p, c)| FileEntry::new(*p, *c))
            .collect();
        let cancel = CancelToken::new();
        let mut sink = |_| {};
        {
            let mut reporter = Reporter::new(&mut sink, &cancel, Phase::Parsing);
            stages::parsing::run(&mut ctx, &mut reporter).unwrap();
        }
        {
            let mut reporter = Reporter::new(&mut sink, &cancel, Phase::Heritage);
            run(&mut ctx, &mut reporter).unwrap();
        }
        ctx
    }

    #[test]
    fn test_extends_same_file() {
        let ctx = run_through_heritage(&[("k.ts", "class A {}\nclass B extends A {}\n")]);
        let edges: Vec<_> = ctx
            .store
            .edges()
            .filter(|e| e.kind == EdgeKind::Extends)
            .collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "class:k.ts:B");
        assert_eq!(edges[0].target, "class:k.ts:A");
        assert_eq!(edges[0].confidence, 1.0);
    }

    #[test]
    fn test_implements_interface() {
        let ctx = run_through_heritage(&[(
            "k.ts",
            "interface Store {}\nclass MemStore implements Store {}\n",
        )]);
        let edges: Vec<_> = ctx
            .store
            .edges()
            .filter(|e| e.kind == EdgeKind::Implements)
            .collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "class:k.ts:MemStore");
        assert_eq!(edges[0].target, "interface:k.ts:Store");
        assert_eq!(edges[0].reason, Reason::None);
    }

    #[test]
    fn test_unknown_base_gets_placeholder() {
        let ctx = run_through_heritage(&[("k.ts", "class B extends External {}\n")]);
        let edges: Vec<_> = ctx
            .store
            .edges()
            .filter(|e| e.kind == EdgeKind::Extends)
            .collect();
        assert_eq!(edges.len(), 1);
        let placeholder = ctx.store.node(&edges[0].target).unwrap();
        assert_eq!(placeholder.name, "External");
        assert!(!placeholder.is_exported());
    }

    #[test]
    fn test_rust_trait_impl() {
        let ctx = run_through_heritage(&[(
            "s.rs",
            "struct Store;\ntrait Backend {}\nimpl Backend for Store {}\n",
        )]);
        let edges: Vec<_> = ctx
            .store
            .edges()
            .filter(|e| e.kind == EdgeKind::Implements)
            .collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "impl:s.rs:Store");
        assert_eq!(edges[0].target, "trait:s.rs:Backend");
        assert_eq!(edges[0].reason, Reason::TraitImpl);
    }

    #[test]
    fn test_self_loop_rejected() {
        // Fuzzy resolution of `Self` hits the class itself.
        let ctx = run_through_heritage(&[("k.ts", "class Loop extends Loop {}\n")]);
        assert!(!ctx.store.edges().any(|e| e.kind == EdgeKind::Extends));
    }
}

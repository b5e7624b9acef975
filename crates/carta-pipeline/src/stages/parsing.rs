//! Parsing stage: definition extraction, DEFINES edges, symbol table.

use carta_core::{ids, GraphEdge, GraphNode};
use carta_parsers::{detect_language, extract};

use crate::context::PipelineContext;
use crate::progress::{PipelineError, ProgressStats, Reporter};

/// Characters of surrounding context attached to each symbol node.
const SYMBOL_CONTENT_CAP: usize = 5_000;
const CONTEXT_LINES: u32 = 2;

pub fn run(ctx: &mut PipelineContext, reporter: &mut Reporter<'_>) -> Result<(), PipelineError> {
    let total = ctx.files.len();
    let files = std::mem::take(&mut ctx.files);

    let result = run_inner(ctx, &files, total, reporter);
    ctx.files = files;
    result
}

fn run_inner(
    ctx: &mut PipelineContext,
    files: &[crate::context::FileEntry],
    total: usize,
    reporter: &mut Reporter<'_>,
) -> Result<(), PipelineError> {
    for (index, file) in files.iter().enumerate() {
        reporter.check_cancelled()?;

        let Some(lang) = detect_language(&file.path) else {
            continue; // unknown language
        };
        ctx.languages.insert(file.path.clone(), lang);

        let tree = match ctx.pool.parse(&file.path, lang, &file.content) {
            Ok(tree) => tree,
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

        let defs = extract::extract_definitions(lang, &query, &tree, file.content.as_bytes());
        for def in defs {
            // First definition of a name in a file wins.
            if ctx.symbols.contains(&file.path, &def.name) {
                continue;
            }
            let content = symbol_context(&file.content, def.start_line, def.end_line);
            let node = GraphNode::symbol(
                def.kind,
                &def.name,
                &file.path,
                def.start_line,
                def.end_line,
                def.is_exported,
                lang,
                Some(content),
            );
            let node_id = node.id.clone();
            ctx.store.add_node(node);
            ctx.store
                .add_edge(GraphEdge::defines(&ids::file_id(&file.path), &node_id));
            ctx.symbols.insert(&file.path, &def.name, &node_id, def.kind);
        }

        if index % 20 == 0 || index + 1 == total {
            reporter.emit(
                (index + 1) as f32 / total.max(1) as f32,
                "extracting definitions",
                Some(ProgressStats {
                    files_processed: index + 1,
                    total_files: total,
                    nodes_created: ctx.store.node_count(),
                }),
            );
        }
    }
    Ok(())
}

/// The symbol's source window: two lines of context either side, capped.
fn symbol_context(content: &str, start_line: u32, end_line: u32) -> String {
    let start = start_line.saturating_sub(CONTEXT_LINES + 1) as usize; // to 0-based
    let end = (end_line + CONTEXT_LINES) as usize;
    content
        .lines()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect::<Vec<_>>()
        .join("\n")
        .chars()
        .take(SYMBOL_CONTENT_CAP)
        .collect()
}

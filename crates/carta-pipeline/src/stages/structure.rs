//! Structure stage: folder/file nodes and CONTAINS chains.

use carta_core::{GraphEdge, GraphNode};
use carta_parsers::detect_language;

use crate::context::PipelineContext;
use crate::progress::{PipelineError, ProgressStats, Reporter};

pub fn run(ctx: &mut PipelineContext, reporter: &mut Reporter<'_>) -> Result<(), PipelineError> {
    let total = ctx.files.len();
    let paths: Vec<String> = ctx.files.iter().map(|f| f.path.clone()).collect();

    for (index, path) in paths.iter().enumerate() {
        reporter.check_cancelled()?;
        add_path(ctx, path);
        if index % 50 == 0 || index + 1 == total {
            reporter.emit(
                (index + 1) as f32 / total.max(1) as f32,
                "building file tree",
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

/// Create missing folder nodes for each path prefix, the file node for the
/// leaf, and a CONTAINS edge from each prefix to its successor. All IDs are
/// deterministic functions of the path.
fn add_path(ctx: &mut PipelineContext, path: &str) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut prefix = String::new();
    let mut parent_id: Option<String> = None;

    for (index, segment) in segments.iter().enumerate() {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        let is_leaf = index + 1 == segments.len();

        let node = if is_leaf {
            GraphNode::file(&prefix, detect_language(&prefix))
        } else {
            GraphNode::folder(&prefix)
        };
        let node_id = node.id.clone();
        ctx.store.add_node(node);

        if let Some(parent) = &parent_id {
            ctx.store.add_edge(GraphEdge::contains(parent, &node_id));
        }
        parent_id = Some(node_id);
    }
}

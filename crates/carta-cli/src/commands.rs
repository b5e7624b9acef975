//! Command implementations. Each returns a process exit code: 0 success,
//! 1 expected failure (nothing indexed, no hits), 2 operational error.

use std::collections::HashMap;
use std::path::Path;

use carta_core::config::CartaConfig;
use carta_core::{query, snapshot, GraphStore};
use carta_parsers::{FileWalker, IgnoreFilter};
use carta_pipeline::{CancelToken, FileEntry, Phase, Pipeline};
use carta_search::{
    auto_encoder, Bm25Index, HashingEncoder, HybridRetriever, TextEncoder, VectorIndex,
};

use crate::cli_args::SearchMode;

pub const CARTA_DIR: &str = ".carta";
const SNAPSHOT_FILE: &str = "graph.json";
const CONFIG_FILE: &str = "carta.json";

pub fn init(verbose: bool) -> i32 {
    let carta_dir = Path::new(CARTA_DIR);
    if let Err(e) = std::fs::create_dir_all(carta_dir) {
        eprintln!("carta init: failed to create {CARTA_DIR}: {e}");
        return 2;
    }
    let config_path = carta_dir.join(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("carta init: already initialized");
        return 0;
    }
    let config = CartaConfig::default();
    let body = match serde_json::to_string_pretty(&config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("carta init: failed to serialize default config: {e}");
            return 2;
        }
    };
    if let Err(e) = std::fs::write(&config_path, body) {
        eprintln!("carta init: failed to write {}: {e}", config_path.display());
        return 2;
    }
    if verbose {
        eprintln!("carta init: wrote {}", config_path.display());
    }
    0
}

pub fn index(path: &Path, json: bool, verbose: bool) -> i32 {
    let config = CartaConfig::load(&path.join(CARTA_DIR));
    let filter = IgnoreFilter::with_patterns(&config.ignore_patterns);
    let files: Vec<FileEntry> = FileWalker::new(path)
        .collect(&filter)
        .into_iter()
        .map(|(p, c)| FileEntry::new(p, c))
        .collect();

    if files.is_empty() {
        eprintln!("carta index: no source files found under {}", path.display());
        return 1;
    }
    if verbose {
        eprintln!("carta index: {} source files", files.len());
    }

    let pipeline = Pipeline::new(config);
    let cancel = CancelToken::new();
    let mut last_phase: Option<Phase> = None;
    let result = pipeline.run(
        files,
        &mut |event| {
            if verbose {
                eprintln!("[{:>5.1}%] {} {}", event.percent, event.phase, event.message);
            } else if last_phase != Some(event.phase) {
                eprintln!("carta index: {}", event.phase);
                last_phase = Some(event.phase);
            }
        },
        &cancel,
    );
    let result = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("carta index: {e}");
            return 2;
        }
    };

    let data = match snapshot::save(&result.graph) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("carta index: snapshot failed: {e}");
            return 2;
        }
    };
    let carta_dir = path.join(CARTA_DIR);
    if let Err(e) = std::fs::create_dir_all(&carta_dir) {
        eprintln!("carta index: failed to create {}: {e}", carta_dir.display());
        return 2;
    }
    let snapshot_path = carta_dir.join(SNAPSHOT_FILE);
    if let Err(e) = std::fs::write(&snapshot_path, data) {
        eprintln!("carta index: failed to write snapshot: {e}");
        return 2;
    }

    if json {
        let summary = serde_json::json!({
            "nodes": result.graph.node_count(),
            "edges": result.graph.edge_count(),
            "communities": result.communities.community_count(),
            "processes": result.processes.process_count(),
        });
        println!("{summary}");
    } else {
        println!(
            "indexed {} nodes, {} edges, {} communities, {} processes",
            result.graph.node_count(),
            result.graph.edge_count(),
            result.communities.community_count(),
            result.processes.process_count(),
        );
    }
    0
}

pub fn search(query_text: &str, limit: usize, mode: SearchMode, offline: bool, json: bool) -> i32 {
    let root = Path::new(".");
    let Some(graph) = load_snapshot(root) else {
        return 2;
    };
    let config = CartaConfig::load(&root.join(CARTA_DIR));
    let filter = IgnoreFilter::with_patterns(&config.ignore_patterns);
    let contents: HashMap<String, String> =
        FileWalker::new(root).collect(&filter).into_iter().collect();

    let bm25 = match Bm25Index::build(&contents) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("carta search: {e}");
            return 2;
        }
    };

    let mut encoder: Box<dyn TextEncoder> = if offline {
        Box::new(HashingEncoder::new())
    } else {
        auto_encoder()
    };

    match mode {
        SearchMode::Bm25 => {
            let hits = match bm25.search(query_text, limit) {
                Ok(h) => h,
                Err(e) => {
                    eprintln!("carta search: {e}");
                    return 2;
                }
            };
            if json {
                let rows: Vec<_> = hits
                    .iter()
                    .map(|h| serde_json::json!({"path": h.path, "score": h.score}))
                    .collect();
                println!("{}", serde_json::json!(rows));
            } else {
                for hit in &hits {
                    println!("{:>8.3}  {}", hit.score, hit.path);
                }
            }
            if hits.is_empty() {
                1
            } else {
                0
            }
        }
        SearchMode::Semantic => {
            let vector = match VectorIndex::build(
                &graph,
                &contents,
                encoder.as_mut(),
                config.embedding.batch_size,
            ) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("carta search: {e}");
                    return 2;
                }
            };
            let hits = match vector.search_text(
                query_text,
                limit,
                config.embedding.max_distance,
                encoder.as_mut(),
            ) {
                Ok(h) => h,
                Err(e) => {
                    eprintln!("carta search: {e}");
                    return 2;
                }
            };
            if json {
                let rows: Vec<_> = hits
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "node_id": h.node_id,
                            "name": h.name,
                            "kind": h.kind,
                            "file_path": h.file_path,
                            "distance": h.distance,
                        })
                    })
                    .collect();
                println!("{}", serde_json::json!(rows));
            } else {
                for hit in &hits {
                    println!("{:>8.3}  {:<10} {}", hit.distance, hit.kind, hit.node_id);
                }
            }
            if hits.is_empty() {
                1
            } else {
                0
            }
        }
        SearchMode::Hybrid => {
            let vector = VectorIndex::build(
                &graph,
                &contents,
                encoder.as_mut(),
                config.embedding.batch_size,
            );
            let mut retriever = HybridRetriever::new(bm25).with_tuning(
                config.retrieval.rrf_k,
                config.retrieval.oversample,
                config.embedding.max_distance,
            );
            match vector {
                Ok(v) => retriever = retriever.with_vector(v, encoder),
                Err(e) => tracing::warn!("vector index unavailable, lexical only: {e}"),
            }
            let hits = match retriever.search(query_text, limit) {
                Ok(h) => h,
                Err(e) => {
                    eprintln!("carta search: {e}");
                    return 2;
                }
            };
            if json {
                match serde_json::to_string(&hits) {
                    Ok(body) => println!("{body}"),
                    Err(e) => {
                        eprintln!("carta search: {e}");
                        return 2;
                    }
                }
            } else {
                for hit in &hits {
                    let sources: Vec<&str> = hit.sources.iter().map(String::as_str).collect();
                    println!(
                        "{:>2}. {:<40} {:.5} [{}]",
                        hit.rank,
                        hit.path,
                        hit.score,
                        sources.join("+")
                    );
                }
            }
            if hits.is_empty() {
                1
            } else {
                0
            }
        }
    }
}

pub fn run_query(statement: &str, json: bool) -> i32 {
    let Some(graph) = load_snapshot(Path::new(".")) else {
        return 2;
    };
    match query::query(&graph, statement) {
        Ok(rows) => {
            if json {
                let body = serde_json::json!({
                    "columns": rows.columns,
                    "rows": rows.rows,
                });
                println!("{body}");
            } else {
                println!("{}", rows.columns.join("\t"));
                for row in &rows.rows {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    println!("{}", cells.join("\t"));
                }
            }
            0
        }
        Err(e) => {
            eprintln!("carta query: {e}");
            2
        }
    }
}

pub fn stats(json: bool) -> i32 {
    let Some(graph) = load_snapshot(Path::new(".")) else {
        return 2;
    };
    let mut kind_counts: std::collections::BTreeMap<&str, usize> = Default::default();
    for node in graph.nodes() {
        *kind_counts.entry(node.kind_str()).or_insert(0) += 1;
    }
    if json {
        let body = serde_json::json!({
            "nodes": graph.node_count(),
            "edges": graph.edge_count(),
            "kinds": kind_counts,
        });
        println!("{body}");
    } else {
        println!("nodes: {}", graph.node_count());
        println!("edges: {}", graph.edge_count());
        for (kind, count) in &kind_counts {
            println!("  {kind:<14} {count}");
        }
    }
    0
}

fn load_snapshot(root: &Path) -> Option<GraphStore> {
    let snapshot_path = root.join(CARTA_DIR).join(SNAPSHOT_FILE);
    let data = match std::fs::read_to_string(&snapshot_path) {
        Ok(d) => d,
        Err(_) => {
            eprintln!("carta: not indexed. Run `carta index` first.");
            return None;
        }
    };
    match snapshot::load(&data) {
        Ok(graph) => Some(graph),
        Err(e) => {
            eprintln!("carta: snapshot unreadable: {e}");
            None
        }
    }
}

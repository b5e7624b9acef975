//! Import stage: specifier resolution and IMPORTS edges.
//!
//! Resolution strategy, first hit wins:
//! 1. Relative specifiers probe a fixed ordered suffix list against the
//!    project file set, rooted at the importing file's directory.
//! 2. Specifiers ending in `.*` are wildcards and never resolve.
//! 3. Package-style specifiers are left-trimmed segment by segment; each
//!    tail is probed with every suffix against path endings, with a
//!    case-insensitive fallback.
//!
//! Results are memoized per `(source file, specifier)` and recorded in the
//! Import Map for the call stage.

use std::collections::{HashMap, HashSet};

use carta_core::{ids, GraphEdge};
use carta_parsers::extract;

use crate::context::PipelineContext;
use crate::progress::{PipelineError, ProgressStats, Reporter};

/// Probe order for both relative and package-style resolution.
const SUFFIXES: &[&str] = &[
    "",
    ".tsx",
    ".ts",
    ".jsx",
    ".js",
    "/index.tsx",
    "/index.ts",
    "/index.jsx",
    "/index.js",
    ".py",
    "/__init__.py",
    ".java",
    ".c",
    ".h",
    ".cpp",
    ".hpp",
    ".cc",
    ".cs",
    ".go",
    ".rs",
    "/mod.rs",
];

pub fn run(ctx: &mut PipelineContext, reporter: &mut Reporter<'_>) -> Result<(), PipelineError> {
    let total = ctx.files.len();
    let files = std::mem::take(&mut ctx.files);
    let mut resolver = ImportResolver::new(files.iter().map(|f| f.path.clone()).collect());

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

            for import in extract::extract_imports(lang, &query, &tree, file.content.as_bytes()) {
                let Some(resolved) = resolver.resolve(&file.path, &import.source) else {
                    continue; // resolution non-hit, not an error
                };
                if resolved == file.path {
                    continue;
                }
                ctx.store.add_edge(GraphEdge::imports(
                    &ids::file_id(&file.path),
                    &ids::file_id(&resolved),
                ));
                ctx.import_map
                    .entry(file.path.clone())
                    .or_default()
                    .insert(resolved);
            }

            if index % 20 == 0 || index + 1 == total {
                reporter.emit(
                    (index + 1) as f32 / total.max(1) as f32,
                    "resolving imports",
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

pub struct ImportResolver {
    /// Sorted for deterministic first-match semantics.
    files: Vec<String>,
    file_set: HashSet<String>,
    memo: HashMap<(String, String), Option<String>>,
}

impl ImportResolver {
    pub fn new(mut files: Vec<String>) -> Self {
        files.sort();
        let file_set = files.iter().cloned().collect();
        ImportResolver {
            files,
            file_set,
            memo: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, source_file: &str, specifier: &str) -> Option<String> {
        let key = (source_file.to_string(), specifier.to_string());
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        let resolved = self.resolve_uncached(source_file, specifier);
        self.memo.insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, source_file: &str, specifier: &str) -> Option<String> {
        if specifier.ends_with(".*") {
            return None; // wildcard import
        }
        let specifier = normalize_specifier(specifier);
        if specifier.starts_with("./") || specifier.starts_with("../") {
            return self.resolve_relative(source_file, &specifier);
        }
        self.resolve_package(&specifier)
    }

    fn resolve_relative(&self, source_file: &str, specifier: &str) -> Option<String> {
        let dir = match source_file.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        let joined = join_normalized(dir, specifier)?;
        for suffix in SUFFIXES {
            let candidate = format!("{joined}{suffix}");
            if self.file_set.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn resolve_package(&self, specifier: &str) -> Option<String> {
        let segments: Vec<&str> = specifier.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return None;
        }
        for trim in 0..segments.len() {
            let tail = segments[trim..].join("/");
            for suffix in SUFFIXES {
                let candidate = format!("{tail}{suffix}");
                if let Some(hit) = self.find_by_ending(&candidate) {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// A project file matches when its path ends in `/<candidate>` or equals
    /// it; exact case first, then case-insensitive.
    fn find_by_ending(&self, candidate: &str) -> Option<String> {
        let slash_candidate = format!("/{candidate}");
        for file in &self.files {
            if file == candidate || file.ends_with(&slash_candidate) {
                return Some(file.clone());
            }
        }
        let lower = candidate.to_lowercase();
        let slash_lower = format!("/{lower}");
        for file in &self.files {
            let file_lower = file.to_lowercase();
            if file_lower == lower || file_lower.ends_with(&slash_lower) {
                return Some(file.clone());
            }
        }
        None
    }
}

/// Rewrites non-path specifier forms into `/`-separated paths:
/// Python leading-dot relatives become `./`/`../` chains, Rust `::` paths
/// and dotted module paths become slash-separated, unless the specifier
/// already names a file (has a probe-list extension).
fn normalize_specifier(specifier: &str) -> String {
    // Python-style relative: one dot = current package, each extra ascends.
    if specifier.starts_with('.')
        && !specifier.starts_with("./")
        && !specifier.starts_with("../")
    {
        let dots = specifier.chars().take_while(|&c| c == '.').count();
        let rest = specifier[dots..].replace('.', "/");
        let mut prefix = if dots == 1 {
            "./".to_string()
        } else {
            "../".repeat(dots - 1)
        };
        prefix.push_str(&rest);
        return prefix;
    }
    if specifier.contains("::") {
        return specifier.replace("::", "/");
    }
    let has_known_extension = SUFFIXES
        .iter()
        .any(|s| !s.is_empty() && !s.starts_with('/') && specifier.ends_with(s));
    if specifier.contains('.') && !specifier.contains('/') && !has_known_extension {
        return specifier.replace('.', "/");
    }
    specifier.to_string()
}

/// Join and normalize `.`/`..` components; `None` when the path escapes
/// the repository root.
fn join_normalized(dir: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(files: &[&str]) -> ImportResolver {
        ImportResolver::new(files.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_relative_with_suffix_probe() {
        let mut r = resolver(&["src/a.ts", "src/b.ts"]);
        assert_eq!(r.resolve("src/a.ts", "./b"), Some("src/b.ts".to_string()));
    }

    #[test]
    fn test_relative_index_probe() {
        let mut r = resolver(&["src/a.ts", "src/widgets/index.ts"]);
        assert_eq!(
            r.resolve("src/a.ts", "./widgets"),
            Some("src/widgets/index.ts".to_string())
        );
    }

    #[test]
    fn test_relative_parent_traversal() {
        let mut r = resolver(&["src/core/engine.ts", "src/util.ts"]);
        assert_eq!(
            r.resolve("src/core/engine.ts", "../util"),
            Some("src/util.ts".to_string())
        );
    }

    #[test]
    fn test_escaping_root_fails() {
        let mut r = resolver(&["a.ts"]);
        assert_eq!(r.resolve("a.ts", "../../outside"), None);
    }

    #[test]
    fn test_wildcard_unresolved() {
        let mut r = resolver(&["java/io/File.java"]);
        assert_eq!(r.resolve("Main.java", "java.io.*"), None);
    }

    #[test]
    fn test_dotted_package_resolution() {
        let mut r = resolver(&["app/pkg/mod.py", "app/main.py"]);
        assert_eq!(
            r.resolve("app/main.py", "pkg.mod"),
            Some("app/pkg/mod.py".to_string())
        );
    }

    #[test]
    fn test_package_left_trimming() {
        let mut r = resolver(&["src/services/auth.py"]);
        assert_eq!(
            r.resolve("main.py", "myproject.services.auth"),
            Some("src/services/auth.py".to_string())
        );
    }

    #[test]
    fn test_python_relative_dot_form() {
        let mut r = resolver(&["pkg/main.py", "pkg/sibling.py", "top.py"]);
        assert_eq!(
            r.resolve("pkg/main.py", ".sibling"),
            Some("pkg/sibling.py".to_string())
        );
        assert_eq!(r.resolve("pkg/main.py", "..top"), Some("top.py".to_string()));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let mut r = resolver(&["src/Services/Auth.cs"]);
        assert_eq!(
            r.resolve("Program.cs", "services.auth"),
            Some("src/Services/Auth.cs".to_string())
        );
    }

    #[test]
    fn test_c_include_keeps_extension() {
        let mut r = resolver(&["src/util.h", "src/main.c"]);
        assert_eq!(
            r.resolve("src/main.c", "util.h"),
            Some("src/util.h".to_string())
        );
    }

    #[test]
    fn test_rust_use_path() {
        let mut r = resolver(&["src/store.rs", "src/main.rs"]);
        assert_eq!(
            r.resolve("src/main.rs", "crate::store"),
            Some("src/store.rs".to_string())
        );
    }

    #[test]
    fn test_go_package_import() {
        let mut r = resolver(&["internal/server/server.go", "cmd/main.go"]);
        assert_eq!(
            r.resolve("cmd/main.go", "example.com/internal/server/server"),
            Some("internal/server/server.go".to_string())
        );
    }

    #[test]
    fn test_memoization() {
        let mut r = resolver(&["src/b.ts"]);
        assert_eq!(r.resolve("src/a.ts", "./b"), Some("src/b.ts".to_string()));
        assert_eq!(r.memo.len(), 1);
        r.resolve("src/a.ts", "./b");
        assert_eq!(r.memo.len(), 1);
    }

    #[test]
    fn test_unresolvable_package() {
        let mut r = resolver(&["src/a.ts"]);
        assert_eq!(r.resolve("src/a.ts", "lodash"), None);
    }
}

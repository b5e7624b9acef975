//! Path classifier for build/vendor/binary exclusion.
//!
//! Four matcher families, checked in order with first-hit short-circuit:
//! path-segment equality, (compound) extension equality, exact filename
//! match, and regex patterns. Paths are normalized to `/` separators
//! before matching.

use regex::Regex;

#[derive(Debug)]
enum IgnoreRule {
    /// Any path segment equals this string (`node_modules`, `target`, ...).
    Segment(&'static str),
    /// Path ends with this suffix, compound extensions included (`.min.js`).
    Extension(&'static str),
    /// The final path segment equals this string (`.DS_Store`).
    FileName(&'static str),
    /// Full-path regex.
    Pattern(Regex),
}

#[derive(Debug)]
pub struct IgnoreFilter {
    rules: Vec<IgnoreRule>,
}

const IGNORED_SEGMENTS: &[&str] = &[
    // Dependency directories
    "node_modules",
    "vendor",
    "bower_components",
    // Build output
    "target",
    "dist",
    "build",
    "out",
    "obj",
    ".next",
    ".nuxt",
    // Python environments and caches
    "__pycache__",
    "venv",
    ".venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    // VCS metadata
    ".git",
    ".svn",
    ".hg",
    // IDE metadata
    ".idea",
    ".vscode",
    // Coverage and caches
    "coverage",
    ".cache",
];

const IGNORED_EXTENSIONS: &[&str] = &[
    // Minified/generated
    ".min.js",
    ".min.css",
    ".map",
    ".lock",
    // Media
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".bmp",
    ".ico",
    ".svg",
    ".webp",
    ".mp3",
    ".mp4",
    ".avi",
    ".mov",
    ".pdf",
    // Fonts
    ".woff",
    ".woff2",
    ".ttf",
    ".eot",
    ".otf",
    // Archives
    ".zip",
    ".tar",
    ".gz",
    ".rar",
    ".7z",
    // Binaries
    ".exe",
    ".dll",
    ".so",
    ".dylib",
    ".bin",
    ".wasm",
    ".class",
    ".jar",
    ".pyc",
    ".pyo",
    ".o",
    ".a",
    // Databases
    ".db",
    ".sqlite",
    ".sqlite3",
];

const IGNORED_FILENAMES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
];

/// Secrets and environment files, wherever they sit in the tree.
const IGNORED_PATTERNS: &[&str] = &[r"(^|/)\.env(\.[^/]+)?$", r"\.(pem|key|p12|pfx)$"];

impl IgnoreFilter {
    pub fn new() -> Self {
        Self::with_patterns(&[])
    }

    /// Build the default rule set plus user-supplied regex patterns
    /// (invalid patterns are skipped with a warning).
    pub fn with_patterns(extra_patterns: &[String]) -> Self {
        let mut rules = Vec::new();
        rules.extend(IGNORED_SEGMENTS.iter().map(|s| IgnoreRule::Segment(s)));
        rules.extend(IGNORED_EXTENSIONS.iter().map(|e| IgnoreRule::Extension(e)));
        rules.extend(IGNORED_FILENAMES.iter().map(|f| IgnoreRule::FileName(f)));
        for pattern in IGNORED_PATTERNS {
            rules.push(IgnoreRule::Pattern(
                Regex::new(pattern).expect("built-in ignore pattern is valid"),
            ));
        }
        for pattern in extra_patterns {
            match Regex::new(pattern) {
                Ok(re) => rules.push(IgnoreRule::Pattern(re)),
                Err(e) => tracing::warn!("invalid ignore pattern {pattern:?}: {e}"),
            }
        }
        IgnoreFilter { rules }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
        for rule in &self.rules {
            let hit = match rule {
                IgnoreRule::Segment(segment) => normalized.split('/').any(|s| s == *segment),
                IgnoreRule::Extension(ext) => normalized.ends_with(ext),
                IgnoreRule::FileName(name) => file_name == *name,
                IgnoreRule::Pattern(re) => re.is_match(&normalized),
            };
            if hit {
                return true;
            }
        }
        false
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new()
    }
}

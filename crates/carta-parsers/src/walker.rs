//! Filesystem front-end for the CLI.
//!
//! Walks a project root (honoring gitignore and `.cartaignore`), keeps
//! recognized source files that pass the [`IgnoreFilter`], and reads their
//! contents into the pipeline's `{path, content}` input shape.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::ignore_filter::IgnoreFilter;
use crate::lang::detect_language;

pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Walk the root and return `(repo-relative path, content)` pairs for
    /// every accepted source file. Unreadable files are skipped with a
    /// warning.
    pub fn collect(&self, filter: &IgnoreFilter) -> Vec<(String, String)> {
        let mut entries = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .add_custom_ignore_filename(".cartaignore")
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.into_path();
            let rel = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            if filter.is_ignored(&rel) || detect_language(&rel).is_none() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => entries.push((rel, content)),
                Err(e) => tracing::warn!("skipping unreadable file {rel}: {e}"),
            }
        }

        entries
    }
}

//! Two-level definition index.
//!
//! The exact index answers "is `name` defined in `file`?" in O(1); the
//! global index lists every definition of a name across the project for
//! fuzzy resolution. Both are written only during the parsing stage and
//! read-only afterwards.

use std::collections::HashMap;

use crate::types::SymbolKind;

/// One definition as seen by the global index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub node_id: String,
    pub file_path: String,
    pub kind: SymbolKind,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    exact: HashMap<(String, String), String>,
    global: HashMap<String, Vec<SymbolEntry>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_path: &str, name: &str, node_id: &str, kind: SymbolKind) {
        self.exact
            .entry((file_path.to_string(), name.to_string()))
            .or_insert_with(|| node_id.to_string());
        self.global
            .entry(name.to_string())
            .or_default()
            .push(SymbolEntry {
                node_id: node_id.to_string(),
                file_path: file_path.to_string(),
                kind,
            });
    }

    /// O(1) lookup of a definition in a specific file.
    pub fn lookup_exact(&self, file_path: &str, name: &str) -> Option<&str> {
        self.exact
            .get(&(file_path.to_string(), name.to_string()))
            .map(String::as_str)
    }

    /// All definitions of `name` across the project, in insertion order.
    pub fn lookup_fuzzy(&self, name: &str) -> &[SymbolEntry] {
        self.global.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` is already defined in `file_path` (used by the parsing
    /// stage to keep the first match when query patterns overlap).
    pub fn contains(&self, file_path: &str, name: &str) -> bool {
        self.lookup_exact(file_path, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let mut table = SymbolTable::new();
        table.insert("src/b.ts", "foo", "function:src/b.ts:foo", SymbolKind::Function);
        assert_eq!(
            table.lookup_exact("src/b.ts", "foo"),
            Some("function:src/b.ts:foo")
        );
        assert_eq!(table.lookup_exact("src/a.ts", "foo"), None);
    }

    #[test]
    fn test_fuzzy_lists_all_definitions() {
        let mut table = SymbolTable::new();
        table.insert("src/a.ts", "run", "function:src/a.ts:run", SymbolKind::Function);
        table.insert("src/b.py", "run", "function:src/b.py:run", SymbolKind::Function);
        let hits = table.lookup_fuzzy("run");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].file_path, "src/a.ts");
        assert_eq!(hits[1].file_path, "src/b.py");
        assert!(table.lookup_fuzzy("missing").is_empty());
    }

    #[test]
    fn test_exact_keeps_first_definition() {
        let mut table = SymbolTable::new();
        table.insert("a.py", "f", "function:a.py:f", SymbolKind::Function);
        table.insert("a.py", "f", "method:a.py:f", SymbolKind::Method);
        assert_eq!(table.lookup_exact("a.py", "f"), Some("function:a.py:f"));
        // Global index still records both occurrences.
        assert_eq!(table.lookup_fuzzy("f").len(), 2);
    }
}

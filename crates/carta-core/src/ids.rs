//! Deterministic identifiers.
//!
//! Node IDs are readable strings derived from the entity's identity
//! (`file:<path>`, `<kind>:<path>:<name>`, ...) so re-running the pipeline
//! on identical input reproduces the same graph. Edge IDs compress their
//! identity tuple through base62(xxhash64) to stay short.

use xxhash_rust::xxh64::xxh64;

use crate::types::SymbolKind;

const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode a u64 value as a base62 string (11 chars, zero-padded).
fn base62_encode(mut value: u64) -> String {
    if value == 0 {
        return "0".repeat(11);
    }
    let mut result = Vec::with_capacity(11);
    while value > 0 {
        let idx = (value % 62) as usize;
        result.push(BASE62_CHARS[idx]);
        value /= 62;
    }
    while result.len() < 11 {
        result.push(b'0');
    }
    result.reverse();
    String::from_utf8(result).expect("base62 chars are valid UTF-8")
}

/// Normalize a path for identity purposes: backslashes become `/`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn folder_id(path: &str) -> String {
    format!("folder:{}", normalize_path(path))
}

pub fn file_id(path: &str) -> String {
    format!("file:{}", normalize_path(path))
}

pub fn symbol_id(kind: SymbolKind, file_path: &str, name: &str) -> String {
    format!("{}:{}:{}", kind.as_str(), normalize_path(file_path), name)
}

pub fn community_id(index: usize) -> String {
    format!("comm_{index}")
}

/// Process IDs embed a sanitized head-symbol name for readability.
pub fn process_id(ordinal: usize, head_name: &str) -> String {
    format!("proc_{}_{}", ordinal, sanitize(head_name))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Edge ID = `<kind>:<base62(xxh64(parts))>`, NUL-separated parts.
pub fn edge_id(kind: &str, parts: &[&str]) -> String {
    let mut input = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        input.push_str(part);
        input.push('\0');
    }
    format!("{}:{}", kind, base62_encode(xxh64(input.as_bytes(), 0)))
}

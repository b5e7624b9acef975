//! Per-language export/visibility detection.
//!
//! Languages encode "exported" very differently; each rule here works off
//! the definition node the query matched. TypeScript keeps a text-prefix
//! scan as a backstop for the cases the structured ancestor walk misses.

use carta_core::Lang;
use tree_sitter::Node;

pub fn is_exported(lang: Lang, name: &str, def_node: Node<'_>, source: &[u8]) -> bool {
    match lang {
        Lang::Python => !name.starts_with('_'),
        Lang::Go => name.chars().next().is_some_and(|c| c.is_uppercase()),
        // No language-level export concept.
        Lang::C | Lang::Cpp => false,
        Lang::TypeScript | Lang::Tsx | Lang::JavaScript => {
            let mut current = Some(def_node);
            while let Some(node) = current {
                if node.kind() == "export_statement" {
                    return true;
                }
                current = node.parent();
            }
            node_text(def_node, source).trim_start().starts_with("export")
        }
        Lang::Java | Lang::CSharp => has_public_modifier(def_node, source),
        Lang::Rust => has_pub_visibility(def_node, source),
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Java wraps modifiers in a `modifiers` node; C# attaches `modifier`
/// children directly to the declaration.
fn has_public_modifier(def_node: Node<'_>, source: &[u8]) -> bool {
    let mut cursor = def_node.walk();
    for child in def_node.children(&mut cursor) {
        if matches!(child.kind(), "modifiers" | "modifier")
            && node_text(child, source).contains("public")
        {
            return true;
        }
    }
    false
}

fn has_pub_visibility(def_node: Node<'_>, source: &[u8]) -> bool {
    let mut cursor = def_node.walk();
    for child in def_node.children(&mut cursor) {
        if child.kind() == "visibility_modifier" && node_text(child, source).contains("pub") {
            return true;
        }
    }
    false
}

//! Query-match decoding.
//!
//! Runs a language's compiled query set over a parsed tree and decodes the
//! captures into plain records the pipeline stages consume. Caller
//! attribution for call sites happens here, while the AST is in hand, so
//! later stages never need to revisit the tree.

use carta_core::{Lang, SymbolKind};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use crate::visibility;

/// A definition site decoded from `@definition.*` + `@name` captures.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: SymbolKind,
    pub name: String,
    /// 1-based line of the `@name` capture.
    pub start_line: u32,
    pub end_line: u32,
    pub is_exported: bool,
}

/// An import site decoded from `@import` + `@import.source`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRef {
    /// The specifier with quote/bracket delimiters stripped.
    pub source: String,
    pub line: u32,
}

/// The callable that lexically encloses a call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub kind: SymbolKind,
    pub name: String,
}

/// A call site decoded from `@call` + `@call.name`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRef {
    pub name: String,
    pub line: u32,
    /// `None` means the call happens at file top level.
    pub caller: Option<Caller>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageRelation {
    Extends,
    Implements,
    TraitImpl,
}

/// An inheritance/conformance site decoded from `@heritage.*` captures.
#[derive(Debug, Clone, PartialEq)]
pub struct HeritageRef {
    pub class_name: String,
    pub relation: HeritageRelation,
    pub target_name: String,
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

pub fn extract_definitions(
    lang: Lang,
    query: &Query,
    tree: &Tree,
    source: &[u8],
) -> Vec<Definition> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    let mut defs = Vec::new();

    while let Some(m) = matches.next() {
        let mut name_node = None;
        let mut def_node = None;
        let mut kind = None;

        for cap in m.captures {
            let cap_name = capture_names[cap.index as usize];
            if cap_name == "name" {
                name_node = Some(cap.node);
            } else if let Some(suffix) = cap_name.strip_prefix("definition.") {
                def_node = Some(cap.node);
                kind = Some(SymbolKind::from_capture_suffix(suffix));
            }
        }

        let (Some(name_node), Some(def_node), Some(kind)) = (name_node, def_node, kind) else {
            continue;
        };
        let name = node_text(name_node, source).to_string();
        if name.is_empty() {
            continue;
        }
        let kind = refine_kind(lang, kind, &name, def_node);
        let is_exported = visibility::is_exported(lang, &name, def_node, source);

        defs.push(Definition {
            kind,
            name,
            start_line: line_of(name_node),
            end_line: name_node.end_position().row as u32 + 1,
            is_exported,
        });
    }

    // Overlapping patterns can match the same inner node, producing
    // identical entries back-to-back.
    defs.dedup_by(|a, b| a.name == b.name && a.start_line == b.start_line);
    defs
}

/// Container kinds whose nested functions count as methods.
fn method_container_kinds(lang: Lang) -> &'static [&'static str] {
    match lang {
        Lang::Python => &["class_definition"],
        Lang::Rust => &["impl_item", "trait_item"],
        _ => &[],
    }
}

fn inside_type_body(lang: Lang, node: Node<'_>) -> bool {
    let containers = method_container_kinds(lang);
    if containers.is_empty() {
        return false;
    }
    let mut current = node.parent();
    while let Some(n) = current {
        if containers.contains(&n.kind()) {
            return true;
        }
        current = n.parent();
    }
    false
}

/// Kind is primarily the capture suffix; functions nested in a class/impl
/// body become methods, and conventionally-named methods become
/// constructors. Caller attribution applies the same refinement so both
/// sides derive the same graph IDs.
fn refine_kind(lang: Lang, kind: SymbolKind, name: &str, def_node: Node<'_>) -> SymbolKind {
    let kind = if kind == SymbolKind::Function && inside_type_body(lang, def_node) {
        SymbolKind::Method
    } else {
        kind
    };
    match (lang, kind) {
        (Lang::TypeScript | Lang::Tsx | Lang::JavaScript, SymbolKind::Method)
            if name == "constructor" =>
        {
            SymbolKind::Constructor
        }
        (Lang::Python, SymbolKind::Method) if name == "__init__" => SymbolKind::Constructor,
        _ => kind,
    }
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

pub fn extract_imports(lang: Lang, query: &Query, tree: &Tree, source: &[u8]) -> Vec<ImportRef> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    let mut imports = Vec::new();

    while let Some(m) = matches.next() {
        let mut source_text = None;
        let mut import_node = None;

        for cap in m.captures {
            match capture_names[cap.index as usize] {
                "import.source" => {
                    let raw = node_text(cap.node, source);
                    source_text = Some(raw.trim_matches(&['"', '\'', '<', '>'][..]).to_string());
                }
                "import" => import_node = Some(cap.node),
                _ => {}
            }
        }

        let (Some(mut spec), Some(import_node)) = (source_text, import_node) else {
            continue;
        };

        match lang {
            // `import a.b.*;` captures `a.b`; restore the wildcard marker.
            Lang::Java => {
                let mut walk = import_node.walk();
                if import_node
                    .children(&mut walk)
                    .any(|c| c.kind() == "asterisk")
                {
                    spec.push_str(".*");
                }
            }
            // `use x::{a, b}` / `use x::y as z` -- keep the path prefix only.
            Lang::Rust => {
                if let Some(idx) = spec.find("::{") {
                    spec.truncate(idx);
                }
                if let Some(idx) = spec.find(" as ") {
                    spec.truncate(idx);
                }
            }
            _ => {}
        }

        if spec.is_empty() {
            continue;
        }
        imports.push(ImportRef {
            source: spec,
            line: line_of(import_node),
        });
    }

    imports
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

pub fn extract_calls(lang: Lang, query: &Query, tree: &Tree, source: &[u8]) -> Vec<CallRef> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    let mut calls = Vec::new();

    while let Some(m) = matches.next() {
        let mut call_name = None;
        let mut call_node = None;

        for cap in m.captures {
            match capture_names[cap.index as usize] {
                "call.name" => call_name = Some(node_text(cap.node, source).to_string()),
                "call" => call_node = Some(cap.node),
                _ => {}
            }
        }

        let (Some(name), Some(call_node)) = (call_name, call_node) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        calls.push(CallRef {
            name,
            line: line_of(call_node),
            caller: attribute_caller(lang, call_node, source),
        });
    }

    calls
}

fn is_callable_boundary(kind: &str) -> bool {
    matches!(
        kind,
        // JS / TS
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "arrow_function"
            | "method_definition"
            // Python, C, C++
            | "function_definition"
            | "lambda"
            // Java / C#
            | "method_declaration"
            | "constructor_declaration"
            | "lambda_expression"
            | "local_function_statement"
            // Go
            | "func_literal"
            // Rust
            | "function_item"
            | "closure_expression"
            | "impl_item"
    )
}

/// Walk ancestors of a call site to the nearest callable boundary that has
/// a derivable name. Anonymous callables fall back to the variable they are
/// bound to; otherwise the walk continues outward. `None` means the call is
/// attributed to the enclosing file.
fn attribute_caller(lang: Lang, call_node: Node<'_>, source: &[u8]) -> Option<Caller> {
    let mut current = call_node.parent();
    while let Some(node) = current {
        if is_callable_boundary(node.kind()) {
            if let Some((base_kind, name)) = boundary_identity(node, source) {
                let kind = refine_kind(lang, base_kind, &name, node);
                return Some(Caller { kind, name });
            }
        }
        current = node.parent();
    }
    None
}

fn boundary_identity(node: Node<'_>, source: &[u8]) -> Option<(SymbolKind, String)> {
    let base_kind = match node.kind() {
        "method_definition" | "method_declaration" => SymbolKind::Method,
        "constructor_declaration" => SymbolKind::Constructor,
        "impl_item" => SymbolKind::Impl,
        _ => SymbolKind::Function,
    };

    if let Some(name_node) = node.child_by_field_name("name") {
        return Some((base_kind, node_text(name_node, source).to_string()));
    }
    if node.kind() == "impl_item" {
        let type_node = node.child_by_field_name("type")?;
        return Some((base_kind, node_text(type_node, source).to_string()));
    }
    // C/C++ function_definition: unwrap the declarator chain.
    if node.kind() == "function_definition" {
        if let Some(name) = declarator_name(node, source) {
            return Some((base_kind, name));
        }
    }
    // Anonymous callable bound to a variable.
    if let Some(parent) = node.parent() {
        if parent.kind() == "variable_declarator" {
            if let Some(name_node) = parent.child_by_field_name("name") {
                return Some((SymbolKind::Function, node_text(name_node, source).to_string()));
            }
        }
    }
    None
}

fn declarator_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    let mut decl = node.child_by_field_name("declarator")?;
    loop {
        match decl.kind() {
            "function_declarator" | "pointer_declarator" | "reference_declarator" => {
                decl = decl.child_by_field_name("declarator")?;
            }
            "qualified_identifier" => {
                decl = decl.child_by_field_name("name")?;
            }
            "identifier" | "field_identifier" => {
                return Some(node_text(decl, source).to_string());
            }
            _ => return None,
        }
    }
}

// ---------------------------------------------------------------------------
// Heritage
// ---------------------------------------------------------------------------

pub fn extract_heritage(
    lang: Lang,
    query: &Query,
    tree: &Tree,
    source: &[u8],
) -> Vec<HeritageRef> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    let mut heritage = Vec::new();

    while let Some(m) = matches.next() {
        let mut class_name = None;
        let mut extends = None;
        let mut implements = None;
        let mut trait_name = None;

        for cap in m.captures {
            let text = node_text(cap.node, source).to_string();
            match capture_names[cap.index as usize] {
                "heritage.class" => class_name = Some(text),
                "heritage.extends" => extends = Some(text),
                "heritage.implements" => implements = Some(text),
                "heritage.trait" => trait_name = Some(text),
                _ => {}
            }
        }

        let Some(class_name) = class_name else {
            continue;
        };
        let (relation, target_name) = if let Some(t) = trait_name {
            (HeritageRelation::TraitImpl, t)
        } else if let Some(t) = implements {
            (HeritageRelation::Implements, t)
        } else if let Some(t) = extends {
            // C# base lists are syntactically uniform; split by naming
            // convention (decision recorded in DESIGN.md).
            if lang == Lang::CSharp && is_interface_name(&t) {
                (HeritageRelation::Implements, t)
            } else {
                (HeritageRelation::Extends, t)
            }
        } else {
            continue;
        };

        heritage.push(HeritageRef {
            class_name,
            relation,
            target_name,
        });
    }

    heritage
}

fn is_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

use serde::{Deserialize, Serialize};

/// Languages the extraction pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Rust,
}

impl Lang {
    /// Returns the canonical lowercase language name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::TypeScript => "typescript",
            Lang::Tsx => "tsx",
            Lang::JavaScript => "javascript",
            Lang::Python => "python",
            Lang::Java => "java",
            Lang::C => "c",
            Lang::Cpp => "cpp",
            Lang::CSharp => "csharp",
            Lang::Go => "go",
            Lang::Rust => "rust",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of an extracted code symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Impl,
    Namespace,
    Module,
    TypeAlias,
    Typedef,
    Macro,
    Union,
    Const,
    Static,
    Property,
    Record,
    Delegate,
    Annotation,
    Constructor,
    Template,
    /// Fallback for definitions the query sets recognize but do not classify.
    CodeElement,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Impl => "impl",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Module => "module",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Macro => "macro",
            SymbolKind::Union => "union",
            SymbolKind::Const => "const",
            SymbolKind::Static => "static",
            SymbolKind::Property => "property",
            SymbolKind::Record => "record",
            SymbolKind::Delegate => "delegate",
            SymbolKind::Annotation => "annotation",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Template => "template",
            SymbolKind::CodeElement => "code_element",
        }
    }

    /// Maps a `@definition.<suffix>` capture suffix to a symbol kind.
    pub fn from_capture_suffix(suffix: &str) -> SymbolKind {
        match suffix {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "struct" => SymbolKind::Struct,
            "enum" => SymbolKind::Enum,
            "trait" => SymbolKind::Trait,
            "impl" => SymbolKind::Impl,
            "namespace" => SymbolKind::Namespace,
            "module" => SymbolKind::Module,
            "type_alias" => SymbolKind::TypeAlias,
            "typedef" => SymbolKind::Typedef,
            "macro" => SymbolKind::Macro,
            "union" => SymbolKind::Union,
            "const" => SymbolKind::Const,
            "static" => SymbolKind::Static,
            "property" => SymbolKind::Property,
            "record" => SymbolKind::Record,
            "delegate" => SymbolKind::Delegate,
            "annotation" => SymbolKind::Annotation,
            "constructor" => SymbolKind::Constructor,
            "template" => SymbolKind::Template,
            _ => SymbolKind::CodeElement,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an inferred execution trace stays inside one community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessFlow {
    IntraCommunity,
    CrossCommunity,
}

impl ProcessFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessFlow::IntraCommunity => "intra_community",
            ProcessFlow::CrossCommunity => "cross_community",
        }
    }
}

/// Kind-specific node payload. The shared header lives on [`GraphNode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Folder,
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<Lang>,
    },
    Symbol {
        symbol: SymbolKind,
        start_line: u32,
        end_line: u32,
        is_exported: bool,
        language: Lang,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Community {
        member_count: u32,
        cohesion: f64,
    },
    Process {
        step_count: u32,
        entry_point_id: String,
        terminal_id: String,
        flow: ProcessFlow,
    },
}

/// A node in the code-intelligence graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    /// `/`-separated repo-relative path. Empty for communities and processes.
    pub file_path: String,
    #[serde(flatten)]
    pub data: NodeData,
}

impl GraphNode {
    pub fn folder(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        GraphNode {
            id: crate::ids::folder_id(path),
            name,
            file_path: path.to_string(),
            data: NodeData::Folder,
        }
    }

    pub fn file(path: &str, language: Option<Lang>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        GraphNode {
            id: crate::ids::file_id(path),
            name,
            file_path: path.to_string(),
            data: NodeData::File { language },
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn symbol(
        kind: SymbolKind,
        name: &str,
        file_path: &str,
        start_line: u32,
        end_line: u32,
        is_exported: bool,
        language: Lang,
        content: Option<String>,
    ) -> Self {
        GraphNode {
            id: crate::ids::symbol_id(kind, file_path, name),
            name: name.to_string(),
            file_path: file_path.to_string(),
            data: NodeData::Symbol {
                symbol: kind,
                start_line,
                end_line,
                is_exported,
                language,
                content,
            },
        }
    }

    pub fn community(index: usize, label: &str, member_count: u32, cohesion: f64) -> Self {
        GraphNode {
            id: crate::ids::community_id(index),
            name: label.to_string(),
            file_path: String::new(),
            data: NodeData::Community {
                member_count,
                cohesion,
            },
        }
    }

    pub fn process(
        ordinal: usize,
        label: &str,
        head_name: &str,
        step_count: u32,
        entry_point_id: &str,
        terminal_id: &str,
        flow: ProcessFlow,
    ) -> Self {
        GraphNode {
            id: crate::ids::process_id(ordinal, head_name),
            name: label.to_string(),
            file_path: String::new(),
            data: NodeData::Process {
                step_count,
                entry_point_id: entry_point_id.to_string(),
                terminal_id: terminal_id.to_string(),
                flow,
            },
        }
    }

    /// The lowercase kind string used in IDs and query labels.
    pub fn kind_str(&self) -> &'static str {
        match &self.data {
            NodeData::Folder => "folder",
            NodeData::File { .. } => "file",
            NodeData::Symbol { symbol, .. } => symbol.as_str(),
            NodeData::Community { .. } => "community",
            NodeData::Process { .. } => "process",
        }
    }

    pub fn symbol_kind(&self) -> Option<SymbolKind> {
        match &self.data {
            NodeData::Symbol { symbol, .. } => Some(*symbol),
            _ => None,
        }
    }

    pub fn is_exported(&self) -> bool {
        matches!(
            &self.data,
            NodeData::Symbol {
                is_exported: true,
                ..
            }
        )
    }

    pub fn line_range(&self) -> Option<(u32, u32)> {
        match &self.data {
            NodeData::Symbol {
                start_line,
                end_line,
                ..
            } => Some((*start_line, *end_line)),
            _ => None,
        }
    }
}

/// Why a resolution-dependent edge points where it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reason {
    /// Unambiguous syntax; serialized as the empty string.
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "import-resolved")]
    ImportResolved,
    #[serde(rename = "same-file")]
    SameFile,
    #[serde(rename = "fuzzy-global")]
    FuzzyGlobal,
    #[serde(rename = "trait-impl")]
    TraitImpl,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::None => "",
            Reason::ImportResolved => "import-resolved",
            Reason::SameFile => "same-file",
            Reason::FuzzyGlobal => "fuzzy-global",
            Reason::TraitImpl => "trait-impl",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Reason::None)
    }
}

/// Relationship kinds. `StepInProcess` carries its per-kind refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Defines,
    Imports,
    Calls,
    Extends,
    Implements,
    MemberOf,
    StepInProcess { step: u32 },
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Defines => "defines",
            EdgeKind::Imports => "imports",
            EdgeKind::Calls => "calls",
            EdgeKind::Extends => "extends",
            EdgeKind::Implements => "implements",
            EdgeKind::MemberOf => "member_of",
            EdgeKind::StepInProcess { .. } => "step_in_process",
        }
    }
}

/// A directed edge in the code-intelligence graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
    /// 1.0 for edges derived from unambiguous syntax; [0.3, 0.9] for calls.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Reason::is_none")]
    pub reason: Reason,
}

impl GraphEdge {
    fn certain(kind: EdgeKind, source: &str, target: &str) -> Self {
        GraphEdge {
            id: crate::ids::edge_id(kind.as_str(), &[source, target]),
            source: source.to_string(),
            target: target.to_string(),
            kind,
            confidence: 1.0,
            reason: Reason::None,
        }
    }

    pub fn contains(source: &str, target: &str) -> Self {
        Self::certain(EdgeKind::Contains, source, target)
    }

    pub fn defines(source: &str, target: &str) -> Self {
        Self::certain(EdgeKind::Defines, source, target)
    }

    pub fn imports(source: &str, target: &str) -> Self {
        Self::certain(EdgeKind::Imports, source, target)
    }

    /// Call edge ID is derived from (caller, callee name, target) so the
    /// same call site resolved twice coalesces in the store.
    pub fn calls(
        source: &str,
        target: &str,
        callee_name: &str,
        confidence: f64,
        reason: Reason,
    ) -> Self {
        GraphEdge {
            id: crate::ids::edge_id("calls", &[source, callee_name, target]),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::Calls,
            confidence,
            reason,
        }
    }

    pub fn extends(source: &str, target: &str) -> Self {
        Self::certain(EdgeKind::Extends, source, target)
    }

    pub fn implements(source: &str, target: &str, reason: Reason) -> Self {
        GraphEdge {
            reason,
            ..Self::certain(EdgeKind::Implements, source, target)
        }
    }

    pub fn member_of(source: &str, community: &str) -> Self {
        Self::certain(EdgeKind::MemberOf, source, community)
    }

    pub fn step_in_process(source: &str, process: &str, step: u32) -> Self {
        GraphEdge {
            id: crate::ids::edge_id("step", &[source, process, &step.to_string()]),
            source: source.to_string(),
            target: process.to_string(),
            kind: EdgeKind::StepInProcess { step },
            confidence: 1.0,
            reason: Reason::None,
        }
    }

    pub fn step(&self) -> Option<u32> {
        match self.kind {
            EdgeKind::StepInProcess { step } => Some(step),
            _ => None,
        }
    }
}

/// Errors from graph storage, snapshots, and queries.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_id_scheme() {
        let node = GraphNode::symbol(
            SymbolKind::Function,
            "foo",
            "src/b.ts",
            3,
            5,
            true,
            Lang::TypeScript,
            None,
        );
        assert_eq!(node.id, "function:src/b.ts:foo");
        assert_eq!(node.kind_str(), "function");
        assert!(node.is_exported());
        assert_eq!(node.line_range(), Some((3, 5)));
    }

    #[test]
    fn test_container_ids() {
        assert_eq!(GraphNode::folder("src/auth").id, "folder:src/auth");
        assert_eq!(GraphNode::file("src/a.ts", None).id, "file:src/a.ts");
        assert_eq!(GraphNode::file("src/a.ts", None).name, "a.ts");
    }

    #[test]
    fn test_call_edge_carries_reason_and_confidence() {
        let edge = GraphEdge::calls(
            "function:a.ts:main",
            "function:b.ts:foo",
            "foo",
            0.9,
            Reason::ImportResolved,
        );
        assert_eq!(edge.kind.as_str(), "calls");
        assert_eq!(edge.confidence, 0.9);
        assert_eq!(edge.reason.as_str(), "import-resolved");
    }

    #[test]
    fn test_certain_edges_have_empty_reason() {
        let edge = GraphEdge::defines("file:a.ts", "function:a.ts:f");
        assert_eq!(edge.confidence, 1.0);
        assert_eq!(edge.reason, Reason::None);
        assert_eq!(edge.reason.as_str(), "");
    }

    #[test]
    fn test_step_edge_refinement() {
        let edge = GraphEdge::step_in_process("function:a.ts:f", "proc_0_main", 3);
        assert_eq!(edge.step(), Some(3));
        assert_eq!(edge.kind.as_str(), "step_in_process");
    }

    #[test]
    fn test_node_serde_roundtrip() {
        let node = GraphNode::symbol(
            SymbolKind::Class,
            "Session",
            "src/auth/session.ts",
            10,
            42,
            true,
            Lang::TypeScript,
            Some("class Session {}".to_string()),
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: GraphNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
        assert!(json.contains("\"kind\":\"symbol\""));
    }

    #[test]
    fn test_edge_serde_roundtrip() {
        let edge = GraphEdge::calls("file:a.py", "function:a.py:helper", "helper", 0.85, Reason::SameFile);
        let json = serde_json::to_string(&edge).unwrap();
        let back: GraphEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(edge, back);
        assert!(json.contains("same-file"));
    }

    #[test]
    fn test_capture_suffix_fallback() {
        assert_eq!(
            SymbolKind::from_capture_suffix("function"),
            SymbolKind::Function
        );
        assert_eq!(
            SymbolKind::from_capture_suffix("weird_thing"),
            SymbolKind::CodeElement
        );
    }
}

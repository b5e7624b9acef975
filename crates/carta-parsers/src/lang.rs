//! Language detection and grammar loading.

use carta_core::Lang;
use tree_sitter::Language;

/// Detect the language of a `/`-separated path from its extension.
pub fn detect_language(path: &str) -> Option<Lang> {
    let file_name = path.rsplit('/').next()?;
    let ext = file_name.rsplit('.').next()?;
    if ext == file_name {
        return None; // no extension
    }
    match ext {
        "ts" => Some(Lang::TypeScript),
        "tsx" | "jsx" => Some(Lang::Tsx),
        "js" | "mjs" | "cjs" => Some(Lang::JavaScript),
        "py" | "pyi" => Some(Lang::Python),
        "java" => Some(Lang::Java),
        "c" | "h" => Some(Lang::C),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Lang::Cpp),
        "cs" => Some(Lang::CSharp),
        "go" => Some(Lang::Go),
        "rs" => Some(Lang::Rust),
        _ => None,
    }
}

/// The tree-sitter grammar for a language.
pub fn grammar(lang: Lang) -> Language {
    match lang {
        Lang::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Lang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Lang::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Lang::Python => tree_sitter_python::LANGUAGE.into(),
        Lang::Java => tree_sitter_java::LANGUAGE.into(),
        Lang::C => tree_sitter_c::LANGUAGE.into(),
        Lang::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        Lang::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Lang::Go => tree_sitter_go::LANGUAGE.into(),
        Lang::Rust => tree_sitter_rust::LANGUAGE.into(),
    }
}

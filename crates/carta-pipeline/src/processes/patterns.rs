//! Fixed pattern tables for entry-point scoring.
//!
//! The regex sets are compiled once per pipeline run. They are intentionally
//! not configurable so that trace extraction stays comparable across runs.

use carta_core::Lang;
use regex::Regex;

/// Names that suggest plumbing rather than an execution entry.
const UTILITY_NAME_PATTERNS: &[&str] = &[
    r"^(get|set|is|has)[A-Z_]",
    r"^(to|from)[A-Z_]",
    r"^(format|parse|validate|convert|normalize|sanitize|escape)",
    r"^(util|helper|assert)",
    r"^_",
];

/// Names that suggest an execution entry in any language.
const ENTRY_NAME_PATTERNS: &[&str] = &[
    r"^main$",
    r"^run$",
    r"^start$",
    r"^init(ialize)?$",
    r"^setup$",
    r"^boot(strap)?$",
    r"^launch$",
    r"^execute$",
    r"^handle[A-Z_]",
    r"^on[A-Z]",
    r"^process[A-Z_]",
    r"^serve",
    r"^listen",
];

fn entry_name_patterns_for(lang: Lang) -> &'static [&'static str] {
    match lang {
        // Next.js route handlers and data-fetching exports.
        Lang::TypeScript | Lang::Tsx | Lang::JavaScript => &[
            r"^(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)$",
            r"^getServerSideProps$",
            r"^getStaticProps$",
            r"^middleware$",
            r"^loader$",
            r"^action$",
        ],
        // Django/Flask view verbs.
        Lang::Python => &[r"^(get|post|put|patch|delete)$", r"^dispatch$", r"^view$"],
        // Servlet verbs.
        Lang::Java => &[r"^do(Get|Post|Put|Delete)$"],
        Lang::Go => &[r"^Serve(HTTP)?$", r"^Handler?$"],
        Lang::Rust => &[r"^handler$"],
        Lang::C | Lang::Cpp | Lang::CSharp => &[],
    }
}

/// `(path pattern, multiplier)` — first match wins, default 1.0.
const FRAMEWORK_PATH_RULES: &[(&str, f64)] = &[
    (r"(^|/)pages/api/", 2.5),                 // Next.js API routes
    (r"(^|/)app/.+/route\.(ts|js)$", 2.5),     // Next.js app router
    (r"(^|/)(routes|controllers|handlers|endpoints)(/|\.)", 2.0), // Express et al.
    (r"views\.py$", 2.0),                      // Django views
    (r"urls\.py$", 1.5),
    (r"Controller\.(java|cs)$", 2.0),          // Spring / ASP.NET
    (r"(^|/)cmd/[^/]+/main\.go$", 2.0),
    (r"main\.go$", 2.0),
    (r"main\.rs$", 2.0),
    (r"main\.(c|cpp|cc)$", 2.0),
    (r"(^|/)(index|server|app)\.(ts|js)$", 1.5),
];

const TEST_FILE_PATTERNS: &[&str] = &[
    r"(^|/)(test|tests|__tests__|spec)(/|$)",
    r"\.(test|spec)\.[^/]+$",
    r"_test\.[^/.]+$",
    r"(^|/)test_[^/]*\.py$",
    r"Tests?\.(java|cs)$",
];

pub struct EntryPatterns {
    utility: Vec<Regex>,
    entry_global: Vec<Regex>,
    entry_per_lang: std::collections::HashMap<Lang, Vec<Regex>>,
    framework: Vec<(Regex, f64)>,
    test_file: Vec<Regex>,
}

const ALL_LANGS: &[Lang] = &[
    Lang::TypeScript,
    Lang::Tsx,
    Lang::JavaScript,
    Lang::Python,
    Lang::Java,
    Lang::C,
    Lang::Cpp,
    Lang::CSharp,
    Lang::Go,
    Lang::Rust,
];

impl EntryPatterns {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("built-in pattern is valid"))
                .collect()
        };
        EntryPatterns {
            utility: compile(UTILITY_NAME_PATTERNS),
            entry_global: compile(ENTRY_NAME_PATTERNS),
            entry_per_lang: ALL_LANGS
                .iter()
                .map(|&lang| (lang, compile(entry_name_patterns_for(lang))))
                .collect(),
            framework: FRAMEWORK_PATH_RULES
                .iter()
                .map(|(p, f)| (Regex::new(p).expect("built-in pattern is valid"), *f))
                .collect(),
            test_file: compile(TEST_FILE_PATTERNS),
        }
    }

    /// 0.3 for utility names, 1.5 for entry names (global or per-language),
    /// 1.0 otherwise.
    pub fn name_factor(&self, name: &str, lang: Option<Lang>) -> f64 {
        if self.utility.iter().any(|re| re.is_match(name)) {
            return 0.3;
        }
        if self.entry_global.iter().any(|re| re.is_match(name)) {
            return 1.5;
        }
        if let Some(per_lang) = lang.and_then(|l| self.entry_per_lang.get(&l)) {
            if per_lang.iter().any(|re| re.is_match(name)) {
                return 1.5;
            }
        }
        1.0
    }

    pub fn framework_factor(&self, path: &str) -> f64 {
        for (re, factor) in &self.framework {
            if re.is_match(path) {
                return *factor;
            }
        }
        1.0
    }

    pub fn is_test_file(&self, path: &str) -> bool {
        self.test_file.iter().any(|re| re.is_match(path))
    }
}

impl Default for EntryPatterns {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_factors() {
        let patterns = EntryPatterns::new();
        assert_eq!(patterns.name_factor("main", None), 1.5);
        assert_eq!(patterns.name_factor("handleRequest", None), 1.5);
        assert_eq!(patterns.name_factor("getName", None), 0.3);
        assert_eq!(patterns.name_factor("_private", None), 0.3);
        assert_eq!(patterns.name_factor("transfer", None), 1.0);
    }

    #[test]
    fn test_per_language_entry_names() {
        let patterns = EntryPatterns::new();
        assert_eq!(patterns.name_factor("GET", Some(Lang::TypeScript)), 1.5);
        assert_eq!(patterns.name_factor("ServeHTTP", Some(Lang::Go)), 1.5);
        assert_eq!(patterns.name_factor("doPost", Some(Lang::Java)), 1.5);
        assert_eq!(patterns.name_factor("GET", Some(Lang::Rust)), 1.0);
    }

    #[test]
    fn test_framework_factors() {
        let patterns = EntryPatterns::new();
        assert_eq!(patterns.framework_factor("pages/api/users.ts"), 2.5);
        assert_eq!(patterns.framework_factor("src/routes/user.js"), 2.0);
        assert_eq!(patterns.framework_factor("shop/views.py"), 2.0);
        assert_eq!(patterns.framework_factor("src/main.rs"), 2.0);
        assert_eq!(patterns.framework_factor("src/lib.rs"), 1.0);
    }

    #[test]
    fn test_test_file_detection() {
        let patterns = EntryPatterns::new();
        assert!(patterns.is_test_file("tests/integration.rs"));
        assert!(patterns.is_test_file("src/app.test.ts"));
        assert!(patterns.is_test_file("pkg/server_test.go"));
        assert!(patterns.is_test_file("tests/test_models.py"));
        assert!(!patterns.is_test_file("src/app.ts"));
    }
}

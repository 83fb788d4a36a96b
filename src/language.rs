//! Language alias resolution.
//!
//! Maps language aliases (e.g., "js", "py", "yml") and common file
//! extensions to canonical language identifiers (e.g., "javascript",
//! "python", "yaml"). Every registry and cache lookup goes through
//! [`LanguageResolver::resolve`] first, so two names denote the same
//! language iff they resolve to the same canonical id.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Resolver for language aliases to canonical names.
#[derive(Debug, Clone, Copy)]
pub struct LanguageResolver {
    /// Map from alias -> canonical name
    alias_map: &'static HashMap<&'static str, &'static str>,
}

impl LanguageResolver {
    /// Create a new resolver using the embedded alias table.
    pub fn new() -> Self {
        Self {
            alias_map: &LANGUAGE_ALIASES,
        }
    }

    /// Resolve a language tag to its canonical name.
    ///
    /// Returns the canonical name if the input is a known alias,
    /// otherwise returns the input trimmed and lowercased.
    pub fn resolve(&self, language: &str) -> String {
        let lower = language.trim().to_lowercase();
        self.alias_map
            .get(lower.as_str())
            .map(|&s| s.to_string())
            .unwrap_or(lower)
    }

    /// Check if a language (or alias) is known.
    pub fn is_known(&self, language: &str) -> bool {
        let lower = language.trim().to_lowercase();
        self.alias_map.contains_key(lower.as_str())
    }

    /// All canonical language ids, sorted and deduplicated.
    pub fn canonical_languages(&self) -> Vec<&'static str> {
        self.alias_map
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Guess the language of a file name, path or URL.
    ///
    /// Well-known file names win over extensions. Query strings and
    /// fragments are ignored.
    pub fn from_path(&self, path: &str) -> Option<&'static str> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        if file_name.is_empty() {
            return None;
        }

        let lower = file_name.to_lowercase();
        if let Some(&language) = SPECIAL_FILE_NAMES.get(lower.as_str()) {
            return Some(language);
        }

        let (_, ext) = lower.rsplit_once('.')?;
        EXTENSION_ONLY
            .get(ext)
            .or_else(|| self.alias_map.get(ext))
            .copied()
    }
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a language name with the default resolver.
pub fn normalize_language(language: &str) -> String {
    LanguageResolver::new().resolve(language)
}

/// File names that identify a language without an extension.
static SPECIAL_FILE_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("dockerfile", "dockerfile");
    m.insert("containerfile", "dockerfile");
    m.insert("makefile", "makefile");
    m.insert("gnumakefile", "makefile");
    m.insert("gemfile", "ruby");
    m.insert("rakefile", "ruby");
    m.insert("cargo.lock", "toml");
    m.insert(".bashrc", "shell");
    m.insert(".zshrc", "shell");
    m.insert(".profile", "shell");
    m
});

/// Extensions that are not useful as aliases in a language tag.
static EXTENSION_ONLY: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("jsx", "javascript");
    m.insert("tsx", "typescript");
    m.insert("pyi", "python");
    m.insert("mk", "makefile");
    m.insert("hh", "cpp");
    m.insert("cshtml", "html");
    m.insert("svg", "xml");
    m.insert("plist", "xml");
    m.insert("bash_profile", "shell");
    m.insert("gradle", "groovy");
    m
});

/// Embedded language alias map.
///
/// The map includes:
/// - Canonical name -> canonical name (identity)
/// - Alias -> canonical name
/// - Extension (without dot) -> canonical name (for common extensions)
static LANGUAGE_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Python
    m.insert("python", "python");
    m.insert("py", "python");
    m.insert("python3", "python");
    m.insert("py3", "python");
    m.insert("pyw", "python");

    // JavaScript
    m.insert("javascript", "javascript");
    m.insert("js", "javascript");
    m.insert("ecmascript", "javascript");
    m.insert("node", "javascript");
    m.insert("nodejs", "javascript");
    m.insert("mjs", "javascript");
    m.insert("cjs", "javascript");

    // TypeScript
    m.insert("typescript", "typescript");
    m.insert("ts", "typescript");
    m.insert("mts", "typescript");
    m.insert("cts", "typescript");

    // Shell
    m.insert("shell", "shell");
    m.insert("bash", "shell");
    m.insert("sh", "shell");
    m.insert("zsh", "shell");
    m.insert("ksh", "shell");
    m.insert("shellscript", "shell");

    // Rust
    m.insert("rust", "rust");
    m.insert("rs", "rust");

    // Go
    m.insert("go", "go");
    m.insert("golang", "go");

    // Ruby
    m.insert("ruby", "ruby");
    m.insert("rb", "ruby");

    // JVM
    m.insert("java", "java");
    m.insert("kotlin", "kotlin");
    m.insert("kt", "kotlin");
    m.insert("kts", "kotlin");
    m.insert("scala", "scala");
    m.insert("groovy", "groovy");

    // C family
    m.insert("c", "c");
    m.insert("h", "c");
    m.insert("c++", "cpp");
    m.insert("cpp", "cpp");
    m.insert("cxx", "cpp");
    m.insert("cc", "cpp");
    m.insert("hpp", "cpp");
    m.insert("c#", "csharp");
    m.insert("csharp", "csharp");
    m.insert("cs", "csharp");
    m.insert("objective-c", "objective-c");
    m.insert("objc", "objective-c");

    // Other general purpose
    m.insert("swift", "swift");
    m.insert("php", "php");
    m.insert("perl", "perl");
    m.insert("pl", "perl");
    m.insert("r", "r");
    m.insert("lua", "lua");
    m.insert("dart", "dart");
    m.insert("haskell", "haskell");
    m.insert("hs", "haskell");
    m.insert("elixir", "elixir");
    m.insert("ex", "elixir");
    m.insert("exs", "elixir");

    // Markup and styles
    m.insert("html", "html");
    m.insert("htm", "html");
    m.insert("xhtml", "html");
    m.insert("vue", "html");
    m.insert("css", "css");
    m.insert("scss", "scss");
    m.insert("less", "less");
    m.insert("xml", "xml");
    m.insert("xsd", "xml");
    m.insert("xsl", "xml");
    m.insert("xslt", "xml");
    m.insert("markdown", "markdown");
    m.insert("md", "markdown");
    m.insert("mkd", "markdown");

    // Data
    m.insert("json", "json");
    m.insert("jsonc", "json");
    m.insert("json5", "json");
    m.insert("geojson", "json");
    m.insert("webmanifest", "json");
    m.insert("yaml", "yaml");
    m.insert("yml", "yaml");
    m.insert("toml", "toml");
    m.insert("ini", "ini");
    m.insert("cfg", "ini");
    m.insert("conf", "ini");

    // Query languages
    m.insert("sql", "sql");
    m.insert("mysql", "sql");
    m.insert("postgresql", "sql");
    m.insert("postgres", "sql");
    m.insert("sqlite", "sql");
    m.insert("plsql", "sql");
    m.insert("graphql", "graphql");
    m.insert("gql", "graphql");

    // Build and infra
    m.insert("dockerfile", "dockerfile");
    m.insert("docker", "dockerfile");
    m.insert("makefile", "makefile");
    m.insert("make", "makefile");
    m.insert("terraform", "terraform");
    m.insert("tf", "terraform");
    m.insert("hcl", "terraform");
    m.insert("protobuf", "protobuf");
    m.insert("proto", "protobuf");
    m.insert("diff", "diff");
    m.insert("patch", "diff");

    m
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_alias() {
        let resolver = LanguageResolver::new();

        assert_eq!(resolver.resolve("py"), "python");
        assert_eq!(resolver.resolve("PY"), "python");
        assert_eq!(resolver.resolve("js"), "javascript");
        assert_eq!(resolver.resolve("JS"), "javascript");
        assert_eq!(resolver.resolve("ts"), "typescript");
        assert_eq!(resolver.resolve("rs"), "rust");
        assert_eq!(resolver.resolve("yml"), "yaml");
        assert_eq!(resolver.resolve("C++"), "cpp");
    }

    #[test]
    fn test_resolve_unknown_language() {
        let resolver = LanguageResolver::new();

        assert_eq!(resolver.resolve("COBOL"), "cobol");
        assert_eq!(resolver.resolve("  Custom "), "custom");
        assert!(!resolver.is_known("cobol"));
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        let resolver = LanguageResolver::new();
        for language in resolver.canonical_languages() {
            assert_eq!(resolver.resolve(language), language);
        }
    }

    #[test]
    fn test_canonical_languages_sorted_and_unique() {
        let languages = LanguageResolver::new().canonical_languages();
        let mut sorted = languages.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(languages, sorted);
        assert!(languages.contains(&"javascript"));
        assert!(!languages.contains(&"js"));
    }

    #[test]
    fn test_from_path() {
        let resolver = LanguageResolver::new();

        assert_eq!(resolver.from_path("src/main.rs"), Some("rust"));
        assert_eq!(resolver.from_path("https://example.com/app.min.js?v=3"), Some("javascript"));
        assert_eq!(resolver.from_path("component.TSX"), Some("typescript"));
        assert_eq!(resolver.from_path("/repo/Dockerfile"), Some("dockerfile"));
        assert_eq!(resolver.from_path("C:\\work\\config.yml"), Some("yaml"));
        assert_eq!(resolver.from_path("README"), None);
        assert_eq!(resolver.from_path("https://example.com/"), None);
        assert_eq!(resolver.from_path("notes.txt"), None);
    }
}

//! Weighted detection patterns.
//!
//! Order matters: when two languages tie on score and pattern count, the
//! one listed first wins. Weights are in 1..=10.

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug)]
pub struct DetectionPattern {
    pub language: &'static str,
    pub regex: Regex,
    pub weight: u32,
}

const PATTERN_TABLE: &[(&str, &str, u32)] = &[
    // JavaScript
    ("javascript", r"\b(?:const|let|var)\s+\w+\s*=", 3),
    ("javascript", r"\bfunction\s*\w*\s*\(", 4),
    ("javascript", r"=>\s*[{(\w]", 3),
    ("javascript", r"\bconsole\.(?:log|error|warn|info)\(", 5),
    ("javascript", r"\b(?:document|window)\.\w+", 4),
    ("javascript", r#"\brequire\(\s*['"]"#, 5),
    (
        "javascript",
        r#"(?m)^\s*(?:import\s+.+\s+from\s+['"]|export\s+(?:default|const|function|class)\b)"#,
        4,
    ),
    // TypeScript
    ("typescript", r":\s*(?:string|number|boolean|any|void|unknown|never)\b", 6),
    ("typescript", r"\binterface\s+\w+\s*\{", 5),
    ("typescript", r"(?m)^\s*(?:export\s+)?type\s+\w+\s*=", 5),
    ("typescript", r"\b(?:public|private|protected|readonly)\s+\w+\s*[:?]", 5),
    ("typescript", r"\bas\s+(?:const|string|number|any|unknown)\b", 5),
    // Python
    ("python", r"(?m)^\s*def\s+\w+\s*\(.*\)\s*(?:->\s*[\w\[\], .]+)?:\s*$", 7),
    ("python", r"(?m)^\s*(?:from\s+[\w.]+\s+import\s+\w|import\s+\w+(?:\s+as\s+\w+)?\s*$)", 5),
    ("python", r"(?m)^\s*class\s+\w+(?:\(.*\))?:\s*$", 6),
    ("python", r"(?m)^\s*(?:elif|except|with)\b.*:\s*$", 6),
    ("python", r"\bself\.\w+", 4),
    ("python", r"\bprint\(", 2),
    ("python", r"\b(?:None|True|False)\b", 2),
    ("python", r#"if\s+__name__\s*==\s*['"]__main__['"]"#, 9),
    // JSON
    ("json", r#"^\s*[\{\[]\s*"[^"]+"\s*:"#, 6),
    ("json", r#""[\w-]+"\s*:\s*(?:"|\d|true|false|null|\[|\{)"#, 3),
    // HTML
    ("html", r"(?i)<!DOCTYPE\s+html", 10),
    ("html", r"(?i)<(?:html|head|body|div|span|p|a|ul|li|table|form)\b[^>]*>", 5),
    ("html", r"(?i)</(?:div|span|p|a|li|body|html|table|form)>", 4),
    // XML
    ("xml", r"^\s*<\?xml\s", 10),
    ("xml", r#"\bxmlns(?::\w+)?=""#, 6),
    ("xml", r"</\w+:\w+>", 4),
    // CSS
    ("css", r"(?m)^\s*[.#]?[\w-]+(?:\s*[,>+~]\s*[.#]?[\w-]+)*\s*\{", 2),
    (
        "css",
        r"\b(?:color|margin|padding|display|font-size|background|border|width|height)\s*:\s*[^;{}]+;",
        5,
    ),
    ("css", r"@(?:media|import|keyframes|font-face)\b", 6),
    // SQL
    ("sql", r"(?is)\bSELECT\b.+?\bFROM\b", 6),
    ("sql", r"(?i)\bINSERT\s+INTO\b", 7),
    ("sql", r"(?i)\bCREATE\s+(?:TABLE|INDEX|VIEW)\b", 8),
    ("sql", r"(?i)\bUPDATE\s+\w+\s+SET\b", 7),
    ("sql", r"(?i)\bWHERE\s+[\w.]+\s*(?:=|<>|!=|\bLIKE\b|\bIN\b)", 4),
    // Rust
    ("rust", r"\bfn\s+\w+\s*(?:<[^>]*>)?\s*\(", 6),
    ("rust", r"\blet\s+mut\s+\w+", 7),
    ("rust", r"(?m)^\s*(?:pub\s+)?(?:struct|enum|trait|impl)\b", 4),
    ("rust", r"\b(?:println|vec|format|assert_eq|panic)!\(", 6),
    ("rust", r"(?m)^\s*use\s+(?:std|crate|super|self)::", 8),
    ("rust", r"&(?:mut\s+)?self\b", 7),
    // Go
    ("go", r"(?m)^\s*package\s+\w+\s*$", 6),
    ("go", r"\bfunc\s+(?:\([^)]*\)\s*)?\w+\s*\(", 7),
    ("go", r":=", 4),
    ("go", r"\bfmt\.\w+\(", 7),
    ("go", r#"(?m)^\s*import\s+(?:\(|")"#, 4),
    // Java
    ("java", r"\bpublic\s+(?:static\s+)?(?:final\s+)?(?:class|void|interface)\b", 6),
    ("java", r"\bSystem\.out\.print(?:ln)?\(", 9),
    ("java", r"(?m)^\s*import\s+java\.", 9),
    ("java", r"@Override\b", 6),
    ("java", r"\bprivate\s+(?:final\s+)?\w+(?:<[^>]*>)?\s+\w+\s*[;=]", 4),
    // C
    ("c", r"(?m)^\s*#include\s*<\w+\.h>", 7),
    ("c", r"\bprintf\s*\(", 4),
    ("c", r"\bint\s+main\s*\(", 5),
    ("c", r"\bmalloc\s*\(", 5),
    // C++
    ("cpp", r"(?m)^\s*#include\s*<(?:iostream|vector|string|map|memory|algorithm)>", 9),
    ("cpp", r"\bstd::\w+", 7),
    ("cpp", r"\b(?:cout|cin|endl)\b", 6),
    ("cpp", r"\btemplate\s*<", 6),
    ("cpp", r"(?m)^\s*using\s+namespace\s+\w+;", 8),
    // C#
    ("csharp", r"(?m)^\s*using\s+System(?:\.\w+)*;", 9),
    ("csharp", r"\bConsole\.Write(?:Line)?\(", 9),
    ("csharp", r"\{\s*get;\s*(?:set;\s*)?\}", 8),
    ("csharp", r"\bnamespace\s+[\w.]+", 3),
    ("csharp", r"\bvar\s+\w+\s*=\s*new\s+\w+", 4),
    // PHP
    ("php", r"<\?php", 10),
    ("php", r"\$\w+\s*=", 4),
    ("php", r"\bfunction\s+\w+\s*\(\s*\$", 7),
    ("php", r"->\w+\(", 3),
    // Ruby
    ("ruby", r"(?m)^\s*def\s+\w+[?!]?(?:\(.*\))?\s*$", 5),
    ("ruby", r"(?m)^\s*end\s*$", 5),
    ("ruby", r"(?m)^\s*puts\s+", 4),
    ("ruby", r#"(?m)^\s*require\s+['"]"#, 5),
    ("ruby", r"\.each\s+do\s*\|", 8),
    ("ruby", r"(?m)^\s*(?:module|class)\s+[A-Z]\w*(?:\s*<\s*\w+)?\s*$", 3),
    // Shell
    ("shell", r"^#!\s*/(?:usr/)?bin/(?:env\s+)?(?:ba|z|k)?sh\b", 10),
    ("shell", r"(?m)^\s*(?:if|while)\s+\[\[?\s", 6),
    ("shell", r"(?m)^\s*(?:fi|done|esac)\s*$", 6),
    ("shell", r"(?m)^\s*echo\s+", 3),
    ("shell", r"\$\{\w+(?:[:#%/][^}]*)?\}", 3),
    ("shell", r"(?m)^\s*export\s+[A-Z_][A-Z0-9_]*=", 6),
    // YAML
    ("yaml", r"(?m)^---\s*$", 3),
    ("yaml", r"(?m)^[\w-]+:\s*$", 3),
    ("yaml", r"(?m)^\s*-\s+[\w-]+:\s", 4),
    ("yaml", r"(?m)^[\w-]+:\s+[^{};]+$", 2),
    // TOML
    ("toml", r"(?m)^\s*\[[\w.-]+\]\s*$", 5),
    ("toml", r"(?m)^\s*\[\[[\w.-]+\]\]\s*$", 8),
    ("toml", r#"(?m)^\s*[\w-]+\s*=\s*(?:"[^"]*"|\d+|true|false|\[)"#, 3),
    // Markdown
    ("markdown", r"(?m)^#{1,6}\s+\S", 3),
    ("markdown", r"(?m)^```\w*\s*$", 6),
    ("markdown", r"\[[^\]]+\]\([^)]+\)", 4),
    ("markdown", r"(?m)^\s*[-*]\s+\[[ x]\]\s", 6),
    ("markdown", r"\*\*[^*\n]+\*\*", 3),
];

/// Compiled pattern table.
pub static PATTERNS: LazyLock<Vec<DetectionPattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .filter_map(|&(language, pattern, weight)| match Regex::new(pattern) {
            Ok(regex) => Some(DetectionPattern {
                language,
                regex,
                weight,
            }),
            Err(e) => {
                log::error!("Invalid detection pattern for {language}: {e}");
                None
            }
        })
        .collect()
});

/// Languages in table order, without duplicates.
pub fn languages() -> Vec<&'static str> {
    let mut seen: Vec<&'static str> = Vec::new();
    for &(language, _, _) in PATTERN_TABLE {
        if !seen.contains(&language) {
            seen.push(language);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(PATTERNS.len(), PATTERN_TABLE.len());
    }

    #[test]
    fn test_weights_in_range() {
        for pattern in PATTERNS.iter() {
            assert!(
                (1..=10).contains(&pattern.weight),
                "{} pattern {} has weight {}",
                pattern.language,
                pattern.regex,
                pattern.weight
            );
        }
    }

    #[test]
    fn test_languages_keep_table_order() {
        let langs = languages();
        assert_eq!(langs[0], "javascript");
        assert_eq!(langs[1], "typescript");
        assert_eq!(langs.len(), 20);
    }
}

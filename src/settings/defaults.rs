//! Global and per-language default settings.

use super::{CommaPosition, KeywordCase, RawSettings, TrailingComma};
use crate::types::{IndentSize, IndentToken, LineWidth};
use std::sync::LazyLock;

/// The lowest-precedence layer. Every field is set.
pub static GLOBAL_DEFAULTS: LazyLock<RawSettings> = LazyLock::new(|| RawSettings {
    indent_size: Some(IndentToken::Width(IndentSize::from_const(2))),
    use_tabs: Some(false),
    single_quote: Some(false),
    semi: Some(true),
    trailing_comma: Some(TrailingComma::Es5),
    line_wrap: Some(LineWidth::from_const(80)),
    keyword_case: Some(KeywordCase::Preserve),
    comma_position: Some(CommaPosition::After),
    align_entries: Some(false),
    align_comments: Some(true),
    indent_tables: Some(false),
});

const fn width(n: u8) -> Option<IndentToken> {
    Some(IndentToken::Width(IndentSize::from_const(n)))
}

/// Defaults for a canonical language id. Unknown languages get an empty layer.
pub fn language_defaults(language: &str) -> RawSettings {
    match language {
        "go" | "makefile" => RawSettings {
            indent_size: width(4),
            use_tabs: Some(true),
            ..Default::default()
        },
        "python" => RawSettings {
            indent_size: width(4),
            line_wrap: Some(LineWidth::from_const(88)),
            ..Default::default()
        },
        "rust" => RawSettings {
            indent_size: width(4),
            line_wrap: Some(LineWidth::from_const(100)),
            trailing_comma: Some(TrailingComma::All),
            ..Default::default()
        },
        "java" | "kotlin" | "c" | "cpp" | "csharp" | "php" | "swift" | "scala" | "dart" | "perl" => {
            RawSettings {
                indent_size: width(4),
                ..Default::default()
            }
        }
        "sql" => RawSettings {
            keyword_case: Some(KeywordCase::Upper),
            ..Default::default()
        },
        "toml" => RawSettings {
            align_entries: Some(false),
            indent_tables: Some(false),
            ..Default::default()
        },
        "json" => RawSettings {
            trailing_comma: Some(TrailingComma::None),
            ..Default::default()
        },
        _ => RawSettings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_defaults_are_complete() {
        let g = &*GLOBAL_DEFAULTS;
        assert!(g.indent_size.is_some());
        assert!(g.use_tabs.is_some());
        assert!(g.single_quote.is_some());
        assert!(g.semi.is_some());
        assert!(g.trailing_comma.is_some());
        assert!(g.line_wrap.is_some());
        assert!(g.keyword_case.is_some());
        assert!(g.comma_position.is_some());
        assert!(g.align_entries.is_some());
        assert!(g.align_comments.is_some());
        assert!(g.indent_tables.is_some());
    }

    #[test]
    fn test_unknown_language_has_empty_layer() {
        assert_eq!(language_defaults("brainfuck"), RawSettings::default());
    }
}

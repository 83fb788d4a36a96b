//! Catch-all whitespace normalizer.
//!
//! Bound to every known language that no dedicated backend claims. It
//! never moves tokens between lines: brace languages get their leading
//! indentation rebuilt from bracket depth, everything else only has
//! trailing whitespace and blank-line runs cleaned up. Lines inside a
//! multi-line literal are left exactly as written.

use super::{Formatter, FormatterMetadata};
use crate::error::FormatError;
use crate::language::LanguageResolver;
use crate::settings::FormatterSettings;
use async_trait::async_trait;

/// Languages whose nesting is expressed with brackets, so re-indenting by
/// bracket depth cannot change meaning.
const BRACE_LANGUAGES: &[&str] = &[
    "c",
    "cpp",
    "csharp",
    "css",
    "dart",
    "go",
    "graphql",
    "groovy",
    "java",
    "javascript",
    "json",
    "kotlin",
    "less",
    "objective-c",
    "perl",
    "php",
    "protobuf",
    "r",
    "rust",
    "scala",
    "scss",
    "swift",
    "terraform",
    "typescript",
];

pub struct FallbackFormatter {
    metadata: FormatterMetadata,
}

impl FallbackFormatter {
    pub fn new() -> Self {
        let languages = LanguageResolver::new().canonical_languages();
        Self {
            metadata: FormatterMetadata::new("fallback", "Whitespace Normalizer", &languages)
                .formatter(false)
                .opinionated(false)
                .tolerant(true),
        }
    }
}

impl Default for FallbackFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Formatter for FallbackFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        &self.metadata
    }

    async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let lexicon = lexicon_for(language);
        match lexicon {
            Some(lexicon) if BRACE_LANGUAGES.contains(&language) => {
                Ok(reindent(code, &settings.indent_unit(), lexicon))
            }
            _ => Ok(clean_whitespace(code, lexicon)),
        }
    }
}

/// How a literal is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Delimiter {
    open: &'static str,
    close: &'static str,
    /// The literal may continue onto the next line
    multiline: bool,
    /// Backslash is not an escape; a doubled closer is
    raw: bool,
}

const fn quoted(quote: &'static str, multiline: bool) -> Delimiter {
    Delimiter {
        open: quote,
        close: quote,
        multiline,
        raw: false,
    }
}

const fn raw(open: &'static str, close: &'static str) -> Delimiter {
    Delimiter {
        open,
        close,
        multiline: true,
        raw: true,
    }
}

/// Comment and literal syntax of a language, enough to tell which lines
/// sit inside a literal or comment.
#[derive(Debug)]
struct Lexicon {
    line_comments: &'static [&'static str],
    block_comments: bool,
    /// Tried in order, so longer openers come first.
    delimiters: &'static [Delimiter],
    /// `'` opens a literal only as `'x'` or `'\..'`; otherwise it is a
    /// lifetime or label.
    char_literals: bool,
}

const C_LIKE: Lexicon = Lexicon {
    line_comments: &["//"],
    block_comments: true,
    delimiters: &[
        quoted("\"\"\"", true),
        quoted("'''", true),
        quoted("\"", true),
        quoted("`", true),
        quoted("'", false),
    ],
    char_literals: false,
};

const CSHARP: Lexicon = Lexicon {
    line_comments: &["//"],
    block_comments: true,
    delimiters: &[quoted("\"\"\"", true), raw("@\"", "\""), quoted("\"", true), quoted("'", false)],
    char_literals: false,
};

const GO: Lexicon = Lexicon {
    line_comments: &["//"],
    block_comments: true,
    delimiters: &[raw("`", "`"), quoted("\"", false), quoted("'", false)],
    char_literals: false,
};

const RUST: Lexicon = Lexicon {
    line_comments: &["//"],
    block_comments: true,
    delimiters: &[raw("r#\"", "\"#"), raw("r\"", "\""), quoted("\"", true)],
    char_literals: true,
};

const CSS: Lexicon = Lexicon {
    line_comments: &[],
    block_comments: true,
    delimiters: &[quoted("\"", false), quoted("'", false)],
    char_literals: false,
};

const SASS: Lexicon = Lexicon {
    line_comments: &["//"],
    ..CSS
};

const PHP: Lexicon = Lexicon {
    line_comments: &["//", "#"],
    block_comments: true,
    delimiters: &[quoted("\"", true), quoted("'", true)],
    char_literals: false,
};

const TERRAFORM: Lexicon = Lexicon {
    line_comments: &["#", "//"],
    block_comments: true,
    delimiters: &[quoted("\"", true)],
    char_literals: false,
};

const HASH: Lexicon = Lexicon {
    line_comments: &["#"],
    block_comments: false,
    delimiters: &[
        quoted("\"\"\"", true),
        quoted("'''", true),
        quoted("\"", true),
        quoted("'", true),
    ],
    char_literals: false,
};

const DASH: Lexicon = Lexicon {
    line_comments: &["--"],
    block_comments: false,
    delimiters: &[quoted("\"", true)],
    char_literals: false,
};

/// Markup, prose and data formats without string syntax get `None`.
fn lexicon_for(language: &str) -> Option<&'static Lexicon> {
    let lexicon = match language {
        "rust" => &RUST,
        "go" => &GO,
        "csharp" => &CSHARP,
        "css" => &CSS,
        "scss" | "less" => &SASS,
        "php" => &PHP,
        "terraform" => &TERRAFORM,
        "python" | "ruby" | "shell" | "perl" | "r" | "elixir" | "graphql" | "toml" | "dockerfile" | "makefile" => {
            &HASH
        }
        "haskell" | "lua" | "sql" => &DASH,
        "c" | "cpp" | "objective-c" | "java" | "kotlin" | "scala" | "groovy" | "swift" | "dart" | "javascript"
        | "typescript" | "json" | "protobuf" => &C_LIKE,
        _ => return None,
    };
    Some(lexicon)
}

/// Where a line leaves off, and so where the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carry {
    Code,
    BlockComment,
    Literal(Delimiter),
}

/// Strip trailing whitespace, drop leading and trailing blank lines and
/// collapse inner blank-line runs to a single blank line. Lines inside a
/// multi-line literal are kept as they are.
fn clean_whitespace(code: &str, lexicon: Option<&Lexicon>) -> String {
    let mut carry = Carry::Code;
    finish(code.lines().map(|raw| {
        let Some(lexicon) = lexicon else {
            return (raw.trim_end().to_string(), false);
        };
        let start = carry;
        let (_, end) = scan_line(raw, start, lexicon);
        carry = end;
        match (start, end) {
            (Carry::Literal(_), _) | (_, Carry::Literal(_)) => (raw.to_string(), true),
            _ => (raw.trim_end().to_string(), false),
        }
    }))
}

/// Joins `(line, verbatim)` pairs. Verbatim lines are never dropped.
fn finish(lines: impl Iterator<Item = (String, bool)>) -> String {
    let mut out: Vec<(String, bool)> = Vec::new();
    for (line, verbatim) in lines {
        if !verbatim && line.is_empty() && out.last().is_none_or(|(prev, _)| prev.is_empty()) {
            continue;
        }
        out.push((line, verbatim));
    }
    while out.last().is_some_and(|(line, verbatim)| line.is_empty() && !verbatim) {
        out.pop();
    }
    if out.is_empty() {
        return String::new();
    }
    let mut text = out.iter().map(|(line, _)| line.as_str()).collect::<Vec<_>>().join("\n");
    text.push('\n');
    text
}

fn reindent(code: &str, unit: &str, lexicon: &Lexicon) -> String {
    let mut depth = 0usize;
    let mut carry = Carry::Code;

    let lines = code.lines().map(|raw| {
        let start = carry;
        let (delta, end) = scan_line(raw, start, lexicon);
        carry = end;

        match start {
            Carry::Literal(_) => {
                depth = depth.saturating_add_signed(delta);
                (raw.to_string(), true)
            }
            Carry::BlockComment => {
                depth = depth.saturating_add_signed(delta);
                let content = raw.trim();
                if content.is_empty() {
                    return (String::new(), false);
                }
                let lead = if content.starts_with('*') { " " } else { "" };
                (format!("{}{lead}{content}", unit.repeat(depth)), false)
            }
            Carry::Code => {
                // Trailing whitespace of an unterminated literal is content.
                let content = match end {
                    Carry::Literal(_) => raw.trim_start(),
                    _ => raw.trim(),
                };
                if content.is_empty() {
                    return (String::new(), false);
                }
                let leading_closers = content.chars().take_while(|c| matches!(c, ')' | ']' | '}')).count();
                let line_depth = depth.saturating_sub(leading_closers);
                depth = depth.saturating_add_signed(delta);
                (format!("{}{content}", unit.repeat(line_depth)), false)
            }
        }
    });

    finish(lines)
}

fn at(chars: &[char], i: usize, pattern: &str) -> bool {
    pattern.chars().enumerate().all(|(k, p)| chars.get(i + k) == Some(&p))
}

/// Prefixed openers like `r"` or `@"` must not continue an identifier.
fn opens_at(chars: &[char], i: usize, delimiter: &Delimiter) -> bool {
    if !at(chars, i, delimiter.open) {
        return false;
    }
    let prefixed = delimiter.open.starts_with(|c: char| c.is_alphanumeric() || c == '@');
    !prefixed || i == 0 || !(chars[i - 1].is_alphanumeric() || chars[i - 1] == '_')
}

/// `#` only starts a comment at a word boundary (`$#`, `a#b` are code).
fn comment_at(chars: &[char], i: usize, marker: &str) -> bool {
    at(chars, i, marker) && (marker != "#" || i == 0 || chars[i - 1].is_whitespace())
}

/// Length of a `'x'` or `'\..'` char literal at `i`, or 1 for a lifetime.
fn char_literal_len(chars: &[char], i: usize) -> usize {
    match (chars.get(i + 1), chars.get(i + 2)) {
        (Some('\\'), _) => chars
            .get(i + 3..)
            .and_then(|rest| rest.iter().position(|&c| c == '\''))
            .map_or(chars.len() - i, |p| p + 4),
        (Some(_), Some('\'')) => 3,
        _ => 1,
    }
}

/// Net bracket change across one line, ignoring literals and comments,
/// and the state the next line starts in.
fn scan_line(line: &str, start: Carry, lexicon: &Lexicon) -> (isize, Carry) {
    let chars: Vec<char> = line.chars().collect();
    let mut delta = 0isize;
    let mut state = start;
    let mut i = 0;

    while i < chars.len() {
        match state {
            Carry::BlockComment => {
                if at(&chars, i, "*/") {
                    state = Carry::Code;
                    i += 2;
                    continue;
                }
            }
            Carry::Literal(d) => {
                if !d.raw && chars[i] == '\\' {
                    i += 2;
                    continue;
                }
                if at(&chars, i, d.close) {
                    i += d.close.chars().count();
                    if d.raw && at(&chars, i, d.close) {
                        i += d.close.chars().count();
                    } else {
                        state = Carry::Code;
                    }
                    continue;
                }
            }
            Carry::Code => {
                if lexicon.line_comments.iter().any(|marker| comment_at(&chars, i, marker)) {
                    break;
                }
                if lexicon.block_comments && at(&chars, i, "/*") {
                    state = Carry::BlockComment;
                    i += 2;
                    continue;
                }
                if lexicon.char_literals && chars[i] == '\'' {
                    i += char_literal_len(&chars, i);
                    continue;
                }
                if let Some(d) = lexicon.delimiters.iter().find(|d| opens_at(&chars, i, d)) {
                    state = Carry::Literal(*d);
                    i += d.open.chars().count();
                    continue;
                }
                match chars[i] {
                    '(' | '[' | '{' => delta += 1,
                    ')' | ']' | '}' => delta -= 1,
                    _ => {}
                }
            }
        }
        i += 1;
    }

    if let Carry::Literal(d) = state
        && !d.multiline
    {
        state = Carry::Code;
    }
    (delta, state)
}

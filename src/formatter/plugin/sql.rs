//! SQL layout plugin.
//!
//! Clause keywords start their own line at the left margin and their
//! bodies are indented one level below. List items at the top level get
//! one line each, with the separator before or after the item depending
//! on [`CommaPosition`]. Anything inside parentheses stays on one line.

use super::FormatPlugin;
use crate::error::FormatError;
use crate::settings::{CommaPosition, FormatterSettings, KeywordCase};

/// Clause phrases, longest first so `LEFT OUTER JOIN` wins over `LEFT JOIN`.
const CLAUSES: &[&[&str]] = &[
    &["LEFT", "OUTER", "JOIN"],
    &["RIGHT", "OUTER", "JOIN"],
    &["FULL", "OUTER", "JOIN"],
    &["GROUP", "BY"],
    &["ORDER", "BY"],
    &["UNION", "ALL"],
    &["INSERT", "INTO"],
    &["DELETE", "FROM"],
    &["LEFT", "JOIN"],
    &["RIGHT", "JOIN"],
    &["INNER", "JOIN"],
    &["FULL", "JOIN"],
    &["CROSS", "JOIN"],
    &["SELECT"],
    &["FROM"],
    &["WHERE"],
    &["HAVING"],
    &["LIMIT"],
    &["OFFSET"],
    &["UNION"],
    &["VALUES"],
    &["UPDATE"],
    &["SET"],
    &["JOIN"],
    &["RETURNING"],
    &["WITH"],
];

const KEYWORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC",
    "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FALSE", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX", "INNER",
    "INSERT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER",
    "OUTER", "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TRUE", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Literal(String),
    Comment { text: String, line: bool },
    Punct(char),
    Operator(String),
}

impl Token {
    fn keyword(&self) -> Option<String> {
        match self {
            Token::Word(w) => {
                let upper = w.to_ascii_uppercase();
                KEYWORDS.contains(&upper.as_str()).then_some(upper)
            }
            _ => None,
        }
    }
}

pub(super) struct SqlPlugin;

impl FormatPlugin for SqlPlugin {
    fn name(&self) -> &str {
        "sql"
    }

    fn supports(&self, language: &str) -> bool {
        language == "sql"
    }

    fn format(&self, code: &str, _language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let tokens = tokenize(code)?;
        Ok(layout(&tokens, settings))
    }
}

fn tokenize(code: &str) -> Result<Vec<Token>, FormatError> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let take_while = |start: usize, pred: &dyn Fn(char) -> bool| {
        let mut end = start;
        while end < chars.len() && pred(chars[end]) {
            end += 1;
        }
        end
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if c == '-' && next == Some('-') {
            let end = take_while(i, &|ch| ch != '\n');
            tokens.push(Token::Comment {
                text: chars[i..end].iter().collect::<String>().trim_end().to_string(),
                line: true,
            });
            i = end;
        } else if c == '/' && next == Some('*') {
            let mut end = i + 2;
            while end + 1 < chars.len() && !(chars[end] == '*' && chars[end + 1] == '/') {
                end += 1;
            }
            if end + 1 >= chars.len() {
                return Err(FormatError::format_failure("Unterminated block comment"));
            }
            tokens.push(Token::Comment {
                text: chars[i..end + 2].iter().collect(),
                line: false,
            });
            i = end + 2;
        } else if matches!(c, '\'' | '"' | '`') {
            // Doubled quote is an escaped quote.
            let mut end = i + 1;
            loop {
                match chars.get(end) {
                    None => {
                        return Err(FormatError::format_failure(format!("Unterminated {c} quote")));
                    }
                    Some(&ch) if ch == c && chars.get(end + 1) == Some(&c) => end += 2,
                    Some(&ch) if ch == c => break,
                    Some(_) => end += 1,
                }
            }
            tokens.push(Token::Literal(chars[i..=end].iter().collect()));
            i = end + 1;
        } else if c.is_ascii_digit() {
            let end = take_while(i, &|ch| ch.is_ascii_alphanumeric() || ch == '.');
            tokens.push(Token::Literal(chars[i..end].iter().collect()));
            i = end;
        } else if c.is_alphabetic() || c == '_' || c == '@' {
            let end = take_while(i + 1, &|ch| ch.is_alphanumeric() || ch == '_' || ch == '$');
            tokens.push(Token::Word(chars[i..end].iter().collect()));
            i = end;
        } else if matches!(c, ',' | ';' | '(' | ')' | '.') {
            tokens.push(Token::Punct(c));
            i += 1;
        } else {
            let end = take_while(i + 1, &|ch| "<>=!|&:~^%".contains(ch));
            tokens.push(Token::Operator(chars[i..end].iter().collect()));
            i = end;
        }
    }

    Ok(tokens)
}

/// Length of the clause phrase starting at `tokens[i]`, if any.
fn clause_at(tokens: &[Token], i: usize) -> Option<usize> {
    CLAUSES
        .iter()
        .find(|phrase| {
            phrase.iter().enumerate().all(|(offset, word)| {
                matches!(tokens.get(i + offset), Some(Token::Word(w)) if w.eq_ignore_ascii_case(word))
            })
        })
        .map(|phrase| phrase.len())
}

struct Layout {
    unit: String,
    lines: Vec<String>,
    line: String,
    indent: usize,
    glue_next: bool,
}

impl Layout {
    fn flush(&mut self) {
        let text = self.line.trim_end();
        if !text.is_empty() {
            self.lines.push(format!("{}{text}", self.unit.repeat(self.indent)));
        }
        self.line.clear();
    }

    fn push(&mut self, text: &str, space: bool) {
        if space && !self.glue_next && !self.line.is_empty() {
            self.line.push(' ');
        }
        self.glue_next = false;
        self.line.push_str(text);
    }
}

fn apply_case(word: &str, upper: &str, case: KeywordCase) -> String {
    match case {
        KeywordCase::Preserve => word.to_string(),
        KeywordCase::Upper => upper.to_string(),
        KeywordCase::Lower => upper.to_ascii_lowercase(),
    }
}

fn layout(tokens: &[Token], settings: &FormatterSettings) -> String {
    let mut out = Layout {
        unit: settings.indent_unit(),
        lines: Vec::new(),
        line: String::new(),
        indent: 0,
        glue_next: false,
    };
    let mut depth = 0usize;
    let mut between_pending = false;
    let mut statement_ended = false;
    let mut prev: Option<&Token> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if statement_ended {
            out.lines.push(String::new());
            out.indent = 0;
            statement_ended = false;
        }

        if depth == 0
            && let Some(len) = clause_at(tokens, i)
        {
            out.flush();
            out.indent = 0;
            let phrase: Vec<String> = tokens[i..i + len]
                .iter()
                .map(|t| match t {
                    Token::Word(w) => apply_case(w, &w.to_ascii_uppercase(), settings.keyword_case),
                    _ => String::new(),
                })
                .collect();
            out.push(&phrase.join(" "), false);
            out.flush();
            out.indent = 1;
            prev = tokens.get(i + len - 1);
            i += len;
            continue;
        }

        let keyword = token.keyword();
        match token {
            Token::Word(w) => {
                if depth == 0 && matches!(keyword.as_deref(), Some("AND" | "OR")) && !between_pending {
                    out.flush();
                }
                if keyword.as_deref() == Some("BETWEEN") {
                    between_pending = true;
                } else if keyword.as_deref() == Some("AND") {
                    between_pending = false;
                }
                let text = match &keyword {
                    Some(upper) => apply_case(w, upper, settings.keyword_case),
                    None => w.clone(),
                };
                let space = !matches!(prev, Some(Token::Punct('(' | '.')));
                out.push(&text, space);
            }
            Token::Literal(text) => {
                let space = !matches!(prev, Some(Token::Punct('(' | '.')));
                out.push(text, space);
            }
            Token::Comment { text, line } => {
                out.push(text, true);
                if *line {
                    out.flush();
                }
            }
            Token::Punct(',') if depth == 0 => match settings.comma_position {
                CommaPosition::After => {
                    out.push(",", false);
                    out.flush();
                }
                CommaPosition::Before => {
                    out.flush();
                    out.push(",", false);
                }
            },
            Token::Punct(';') => {
                out.push(";", false);
                out.flush();
                depth = 0;
                statement_ended = i + 1 < tokens.len();
            }
            Token::Punct('(') => {
                // Function calls hug their argument list.
                let call = matches!(prev, Some(t @ Token::Word(_)) if t.keyword().is_none());
                let space = !call && !matches!(prev, Some(Token::Punct('(' | '.')));
                out.push("(", space);
                depth += 1;
            }
            Token::Punct(')') => {
                out.push(")", false);
                depth = depth.saturating_sub(1);
            }
            Token::Punct(c) => {
                out.push(&c.to_string(), false);
                if *c == '.' {
                    out.glue_next = true;
                }
            }
            Token::Operator(op) => {
                let unary = (op == "-" || op == "+")
                    && matches!(prev, None | Some(Token::Operator(_) | Token::Punct('(' | ',')))
                    || (op == "-" || op == "+") && prev.is_some_and(|p| p.keyword().is_some());
                let space = !matches!(prev, Some(Token::Punct('(' | '.')));
                out.push(op, space);
                if unary {
                    out.glue_next = true;
                }
            }
        }

        prev = Some(token);
        i += 1;
    }

    out.flush();
    if out.lines.is_empty() {
        return String::new();
    }
    let mut text = out.lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{RawSettings, resolve};
    use pretty_assertions::assert_eq;

    fn format_with(code: &str, raw: RawSettings) -> String {
        SqlPlugin.format(code, "sql", &resolve(&raw, "sql")).unwrap()
    }

    #[test]
    fn test_clause_layout_with_trailing_commas() {
        let out = format_with("select a, b from t where a = 1 and b > 2;", RawSettings::default());
        assert_eq!(out, "SELECT\n  a,\n  b\nFROM\n  t\nWHERE\n  a = 1\n  AND b > 2;\n");
    }

    #[test]
    fn test_leading_commas() {
        let raw = RawSettings {
            comma_position: Some(CommaPosition::Before),
            ..Default::default()
        };
        let out = format_with("SELECT a, b FROM t", raw);
        assert_eq!(out, "SELECT\n  a\n  , b\nFROM\n  t\n");
    }

    #[test]
    fn test_lowercase_and_preserved_keywords() {
        let lower = RawSettings {
            keyword_case: Some(KeywordCase::Lower),
            ..Default::default()
        };
        assert_eq!(format_with("SELECT X FROM T", lower), "select\n  X\nfrom\n  T\n");

        let preserve = RawSettings {
            keyword_case: Some(KeywordCase::Preserve),
            ..Default::default()
        };
        assert_eq!(format_with("Select x From t", preserve), "Select\n  x\nFrom\n  t\n");
    }

    #[test]
    fn test_parentheses_stay_inline() {
        let out = format_with(
            "select count(*), t.id from (select id from u where x in (1, 2)) t left join v on v.id = t.id",
            RawSettings::default(),
        );
        assert_eq!(
            out,
            "SELECT\n  count(*),\n  t.id\nFROM\n  (SELECT id FROM u WHERE x IN (1, 2)) t\nLEFT JOIN\n  v ON v.id = t.id\n"
        );
    }

    #[test]
    fn test_between_keeps_its_and() {
        let out = format_with("select a from t where a between 1 and 5 and b = -1", RawSettings::default());
        assert_eq!(out, "SELECT\n  a\nFROM\n  t\nWHERE\n  a BETWEEN 1 AND 5\n  AND b = -1\n");
    }

    #[test]
    fn test_statements_are_separated_and_strings_untouched() {
        let out = format_with("select 'a, b' from t; select 2", RawSettings::default());
        assert_eq!(out, "SELECT\n  'a, b'\nFROM\n  t;\n\nSELECT\n  2\n");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = SqlPlugin
            .format("select 'oops", "sql", &FormatterSettings::for_language("sql"))
            .unwrap_err();
        assert!(err.message.contains("Unterminated"));
    }
}

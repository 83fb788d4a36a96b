//! Always-ready beautifier for scripts, style sheets, data and markup.
//!
//! This backend is best-effort: it re-flows brace structure and markup
//! nesting and never rejects input. Opinionated formatters registered
//! after it take over the languages they declare.

use super::{Formatter, FormatterMetadata};
use crate::error::FormatError;
use crate::settings::{FormatterSettings, QuoteStyle};
use async_trait::async_trait;

const LANGUAGES: &[&str] = &["javascript", "typescript", "json", "css", "scss", "less", "html", "xml"];

/// Void elements never get a closing tag in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose content is emitted without re-flowing.
const RAW_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

pub struct BeautifyFormatter {
    metadata: FormatterMetadata,
}

impl BeautifyFormatter {
    pub fn new() -> Self {
        Self {
            metadata: FormatterMetadata::new("beautify", "Beautify", LANGUAGES)
                .formatter(false)
                .opinionated(false)
                .tolerant(true),
        }
    }
}

impl Default for BeautifyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Formatter for BeautifyFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        &self.metadata
    }

    async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let mode = match language {
            "javascript" | "typescript" => BraceMode::Script,
            "css" => BraceMode::Style { line_comments: false },
            "scss" | "less" => BraceMode::Style { line_comments: true },
            "json" => BraceMode::Data,
            "html" => return Ok(beautify_markup(code, settings, true)),
            "xml" => return Ok(beautify_markup(code, settings, false)),
            other => {
                return Err(FormatError::format_failure(format!(
                    "Beautifier does not handle language '{other}'"
                )));
            }
        };
        Ok(beautify_braces(code, settings, mode))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceMode {
    Script,
    Style { line_comments: bool },
    Data,
}

impl BraceMode {
    fn line_comments(self) -> bool {
        match self {
            Self::Script => true,
            Self::Style { line_comments } => line_comments,
            Self::Data => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    /// Statement block or rule set
    Block,
    /// Object/array literal: entries go one per line, no semicolons
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: BlockKind,
    /// Paren depth outside the block, restored when it closes
    outer_parens: usize,
}

/// Accumulates output lines at the current nesting depth.
struct LineWriter {
    out: String,
    line: String,
    depth: usize,
    unit: String,
    blank_pending: bool,
}

impl LineWriter {
    fn new(unit: String) -> Self {
        Self {
            out: String::new(),
            line: String::new(),
            depth: 0,
            unit,
            blank_pending: false,
        }
    }

    fn push_space(&mut self) {
        if !self.line.is_empty() && !self.line.ends_with(' ') {
            self.line.push(' ');
        }
    }

    fn flush(&mut self) {
        let text = self.line.trim();
        if !text.is_empty() {
            if self.blank_pending && !self.out.is_empty() {
                self.out.push('\n');
            }
            self.blank_pending = false;
            for _ in 0..self.depth {
                self.out.push_str(&self.unit);
            }
            self.out.push_str(text);
            self.out.push('\n');
        }
        self.line.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

fn beautify_braces(code: &str, settings: &FormatterSettings, mode: BraceMode) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut w = LineWriter::new(settings.indent_unit());
    let mut frames: Vec<Frame> = Vec::new();
    let mut parens = 0usize;
    let mut newlines = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\n' {
            newlines += 1;
            if newlines == 2 {
                w.blank_pending = !w.out.is_empty();
            }
            // A paren left open by a line that reads as complete is a stray.
            if mode == BraceMode::Script && parens > 0 && ends_statement(&w.line, &chars, i + 1) {
                parens = 0;
            }
            if mode != BraceMode::Data && parens == 0 {
                w.flush();
            } else {
                w.push_space();
            }
            i += 1;
            continue;
        }
        if !c.is_whitespace() {
            newlines = 0;
        }

        if c == '/'
            && mode == BraceMode::Script
            && !matches!(next, Some('/' | '*'))
            && regex_allowed(&w.line)
            && let Some(end) = scan_regex(&chars, i)
        {
            w.line.extend(&chars[i..end]);
            i = end;
            continue;
        }

        match c {
            '"' | '\'' | '`' if !(c == '`' && mode != BraceMode::Script) => {
                let end = scan_string(&chars, i);
                let literal: String = chars[i..end].iter().collect();
                if mode == BraceMode::Script {
                    w.line.push_str(&requote(&literal, settings.quote_style));
                } else {
                    w.line.push_str(&literal);
                }
                i = end;
                continue;
            }
            '/' if next == Some('/') && mode.line_comments() => {
                let end = chars[i..].iter().position(|&ch| ch == '\n').map_or(chars.len(), |p| i + p);
                let comment: String = chars[i..end].iter().collect();
                w.push_space();
                w.line.push_str(comment.trim_end());
                w.flush();
                i = end;
                continue;
            }
            '/' if next == Some('*') => {
                let end = find_block_comment_end(&chars, i + 2);
                let comment: String = chars[i..end].iter().collect();
                let mut parts = comment.split('\n').peekable();
                while let Some(part) = parts.next() {
                    let part = part.trim();
                    if part.starts_with('*') && w.line.is_empty() {
                        w.line.push(' ');
                    } else {
                        w.push_space();
                    }
                    w.line.push_str(part);
                    if parts.peek().is_some() {
                        w.flush();
                    }
                }
                i = end;
                continue;
            }
            '{' | '[' if c == '{' || mode == BraceMode::Data => {
                let close = if c == '{' { '}' } else { ']' };
                if let Some(j) = next_significant(&chars, i + 1)
                    && chars[j] == close
                {
                    if c == '{' {
                        w.push_space();
                    }
                    w.line.push(c);
                    w.line.push(close);
                    i = j + 1;
                    continue;
                }

                let kind = if mode == BraceMode::Data || (mode == BraceMode::Script && opens_literal(&w.line)) {
                    BlockKind::Literal
                } else {
                    BlockKind::Block
                };
                if c == '{' && mode != BraceMode::Data {
                    w.push_space();
                }
                w.line.push(c);
                w.flush();
                w.depth += 1;
                frames.push(Frame {
                    kind,
                    outer_parens: parens,
                });
                parens = 0;
            }
            '}' | ']' if c == '}' || mode == BraceMode::Data => {
                let frame = frames.pop();
                let wants_semicolon = match mode {
                    BraceMode::Script => settings.semi && frame.is_none_or(|f| f.kind == BlockKind::Block),
                    BraceMode::Style { .. } => true,
                    BraceMode::Data => false,
                };
                if wants_semicolon && needs_semicolon(&w.line) {
                    w.line.push(';');
                }
                w.flush();
                w.depth = w.depth.saturating_sub(1);
                parens = frame.map_or(0, |f| f.outer_parens);
                w.line.push(c);

                match next_significant(&chars, i + 1) {
                    Some(j) if matches!(chars[j], ';' | ',' | ')' | ']' | '.' | '(') => {}
                    Some(j) if matches!(word_at(&chars, j).as_str(), "else" | "catch" | "finally" | "while") => {
                        w.line.push(' ');
                        i = j;
                        continue;
                    }
                    _ => w.flush(),
                }
            }
            '(' | '[' => {
                parens += 1;
                w.line.push(c);
            }
            ')' | ']' => {
                parens = parens.saturating_sub(1);
                w.line.push(c);
            }
            ';' => {
                w.line.push(';');
                if parens == 0 && !trailing_comment_follows(&chars, i + 1) {
                    w.flush();
                }
            }
            ',' => {
                w.line.push(',');
                let in_literal = frames.last().is_some_and(|f| f.kind == BlockKind::Literal);
                if in_literal && parens == 0 {
                    w.flush();
                }
            }
            ':' if mode == BraceMode::Data => {
                w.line.push_str(": ");
                i = next_significant(&chars, i + 1).unwrap_or(chars.len());
                continue;
            }
            c if c.is_whitespace() => {
                w.push_space();
            }
            _ => w.line.push(c),
        }
        i += 1;
    }

    w.finish()
}

/// Index just past the closing quote, or the end of the line for an
/// unterminated single-line string.
fn scan_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ch if ch == quote => return i + 1,
            '\n' if quote != '`' => return i,
            _ => i += 1,
        }
    }
    chars.len()
}

/// A `/` where an operand is expected starts a regex literal, not a division.
fn regex_allowed(line: &str) -> bool {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.ends_with(['(', ',', '=', ':', '[', '!', '&', '|', '?', '{', ';', '+', '-', '*', '%', '<', '>', '~', '^']) {
        return true;
    }
    let word: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    matches!(
        word.as_str(),
        "return" | "typeof" | "case" | "do" | "else" | "in" | "of" | "delete" | "void" | "throw" | "yield" | "await"
    )
}

/// Index just past a regex literal and its flags, or `None` when the line
/// ends first and the `/` is a plain character after all.
fn scan_regex(chars: &[char], start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' => return None,
            '[' => {
                in_class = true;
                i += 1;
            }
            ']' => {
                in_class = false;
                i += 1;
            }
            '/' if !in_class => {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
    None
}

/// True when a newline inside parens ends the statement: the line ends in
/// an operand and the next line does not continue it.
fn ends_statement(line: &str, chars: &[char], from: usize) -> bool {
    if !needs_semicolon(line) {
        return false;
    }
    match next_significant(chars, from) {
        Some(j) => !matches!(
            chars[j],
            ')' | ']' | '}' | ',' | '.' | '?' | ':' | '+' | '-' | '*' | '/' | '%' | '=' | '&' | '|' | '<' | '>'
        ),
        None => true,
    }
}

fn find_block_comment_end(chars: &[char], from: usize) -> usize {
    let mut i = from;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn next_significant(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| !chars[j].is_whitespace())
}

fn word_at(chars: &[char], from: usize) -> String {
    chars[from..].iter().take_while(|c| c.is_ascii_alphabetic()).collect()
}

fn trailing_comment_follows(chars: &[char], from: usize) -> bool {
    let mut j = from;
    while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
        j += 1;
    }
    j + 1 < chars.len() && chars[j] == '/' && chars[j + 1] == '/'
}

/// A `{` after an assignment, argument separator or `return` opens an
/// object literal rather than a block.
fn opens_literal(line: &str) -> bool {
    let trimmed = line.trim_end();
    if trimmed.ends_with("=>") {
        return false;
    }
    trimmed.ends_with(['=', '(', ',', ':', '[', '?', '|', '&']) || trimmed.ends_with("return")
}

/// True if the last statement of a block is missing its terminator.
fn needs_semicolon(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.ends_with("*/") {
        return false;
    }
    !trimmed.ends_with([';', ',', '{', '}', '(', '[', ':', '+', '-', '*', '/', '=', '&', '|', '?', '<', '>', '!'])
}

/// Switch string delimiters to the preferred quote when no escaping is needed.
fn requote(literal: &str, style: QuoteStyle) -> String {
    let (from, to) = match style {
        QuoteStyle::Single => ('"', '\''),
        QuoteStyle::Double => ('\'', '"'),
    };
    let chars: Vec<char> = literal.chars().collect();
    if chars.len() < 2 || chars[0] != from || chars[chars.len() - 1] != from {
        return literal.to_string();
    }
    let inner: String = chars[1..chars.len() - 1].iter().collect();
    if inner.contains(to) || inner.contains('\\') {
        return literal.to_string();
    }
    format!("{to}{inner}{to}")
}

#[derive(Debug)]
enum MarkupToken<'a> {
    Open { name: String, raw: &'a str, self_closing: bool },
    Close { name: String, raw: &'a str },
    Text(&'a str),
    Other(&'a str),
}

fn tokenize_markup(code: &str, html: bool) -> Vec<MarkupToken<'_>> {
    let bytes = code.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = code[i..].find('<').map_or(code.len(), |p| i + p);
            tokens.push(MarkupToken::Text(&code[i..end]));
            i = end;
            continue;
        }

        if code[i..].starts_with("<!--") {
            let end = code[i..].find("-->").map_or(code.len(), |p| i + p + 3);
            tokens.push(MarkupToken::Other(&code[i..end]));
            i = end;
            continue;
        }

        let Some(end) = find_tag_end(bytes, i + 1) else {
            tokens.push(MarkupToken::Text(&code[i..]));
            break;
        };
        let raw = &code[i..end];
        i = end;

        if raw.starts_with("<!") || raw.starts_with("<?") {
            tokens.push(MarkupToken::Other(raw));
            continue;
        }

        let closing = raw.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name: String = raw[name_start..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();
        let name = if html { name.to_ascii_lowercase() } else { name };

        if closing {
            tokens.push(MarkupToken::Close { name, raw });
            continue;
        }

        let self_closing = raw.ends_with("/>") || (html && VOID_ELEMENTS.contains(&name.as_str()));
        if html && !self_closing && RAW_ELEMENTS.contains(&name.as_str()) {
            let close_at = find_case_insensitive(&code[i..], &format!("</{name}")).map(|p| i + p);
            if let Some(close_start) = close_at {
                tokens.push(MarkupToken::Open {
                    name: name.clone(),
                    raw,
                    self_closing: false,
                });
                tokens.push(MarkupToken::Other(&code[i..close_start]));
                i = close_start;
                continue;
            }
        }
        tokens.push(MarkupToken::Open { name, raw, self_closing });
    }

    tokens
}

fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + offset + 1),
            None => {}
        }
    }
    None
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn beautify_markup(code: &str, settings: &FormatterSettings, html: bool) -> String {
    let tokens = tokenize_markup(code, html);
    let unit = settings.indent_unit();
    let mut lines: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut verbatim: Option<&str> = None;
    let mut k = 0;

    let emit = |lines: &mut Vec<String>, depth: usize, text: &str| {
        lines.push(format!("{}{}", unit.repeat(depth), text));
    };

    while k < tokens.len() {
        match &tokens[k] {
            MarkupToken::Open { name, raw, self_closing } => {
                if !self_closing {
                    // Short element with only text inside stays on one line.
                    let inline = match (tokens.get(k + 1), tokens.get(k + 2)) {
                        (Some(MarkupToken::Close { name: close, raw: close_raw }), _) if close == name => {
                            Some((format!("{raw}{close_raw}"), 2))
                        }
                        (Some(MarkupToken::Text(text)), Some(MarkupToken::Close { name: close, raw: close_raw }))
                            if close == name && !RAW_ELEMENTS.contains(&name.as_str()) =>
                        {
                            let text = collapse_whitespace(text);
                            let line = format!("{raw}{text}{close_raw}");
                            (line.len() + depth * settings.indent_columns() <= settings.line_wrap.effective_limit())
                                .then_some((line, 3))
                        }
                        _ => None,
                    };
                    if let Some((line, consumed)) = inline {
                        emit(&mut lines, depth, &line);
                        k += consumed;
                        continue;
                    }
                }

                emit(&mut lines, depth, raw.trim());
                if !self_closing {
                    depth += 1;
                    if RAW_ELEMENTS.contains(&name.as_str())
                        && let Some(MarkupToken::Other(content)) = tokens.get(k + 1)
                    {
                        if name == "pre" || name == "textarea" {
                            // Whitespace is significant: keep verbatim.
                            if let Some(last) = lines.last_mut() {
                                last.push_str(content);
                            }
                            verbatim = Some(name.as_str());
                        } else {
                            for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
                                emit(&mut lines, depth, line);
                            }
                        }
                        k += 1;
                    }
                }
            }
            MarkupToken::Close { name, raw } => {
                depth = depth.saturating_sub(1);
                if verbatim == Some(name.as_str())
                    && let Some(last) = lines.last_mut()
                {
                    verbatim = None;
                    last.push_str(raw);
                } else {
                    emit(&mut lines, depth, raw.trim());
                }
            }
            MarkupToken::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    emit(&mut lines, depth, &text);
                }
            }
            MarkupToken::Other(raw) => {
                let raw = raw.trim();
                if !raw.is_empty() {
                    emit(&mut lines, depth, raw);
                }
            }
        }
        k += 1;
    }

    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

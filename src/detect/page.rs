//! Decides whether a page is a code page worth auto-formatting.
//!
//! Checks run in order, and the first that applies decides:
//!
//! 1. empty or oversized text is never formatted
//! 2. a code MIME type decides directly
//! 3. a rich (non-raw) document is never a code page
//! 4. a source-file extension in the URL decides directly
//! 5. the detector must classify the text and the text must look like code

use super::LanguageDetector;
use crate::language::LanguageResolver;
use serde::Serialize;

/// Pages larger than this are left alone.
pub const MAX_PAGE_BYTES: usize = 1024 * 1024;

/// Share of non-blank lines that must look like code.
const CODE_LINE_RATIO: f64 = 0.5;

/// Lines inspected by [`looks_like_code`].
const MAX_INSPECTED_LINES: usize = 200;

/// MIME essence -> canonical language.
const CODE_MIME_TYPES: &[(&str, &str)] = &[
    ("application/json", "json"),
    ("application/ld+json", "json"),
    ("application/manifest+json", "json"),
    ("application/javascript", "javascript"),
    ("application/x-javascript", "javascript"),
    ("text/javascript", "javascript"),
    ("application/typescript", "typescript"),
    ("text/css", "css"),
    ("application/xml", "xml"),
    ("text/xml", "xml"),
    ("application/x-yaml", "yaml"),
    ("application/yaml", "yaml"),
    ("text/yaml", "yaml"),
    ("text/x-yaml", "yaml"),
    ("application/toml", "toml"),
    ("text/x-python", "python"),
    ("application/x-sh", "shell"),
    ("text/x-sh", "shell"),
    ("application/sql", "sql"),
    ("text/x-rust", "rust"),
    ("text/x-go", "go"),
    ("text/x-java-source", "java"),
    ("text/x-c", "c"),
];

/// What the presentation layer knows about the current page.
#[derive(Debug, Clone, Copy)]
pub struct PageInfo<'a> {
    pub url: &'a str,
    /// Content-Type header, parameters included
    pub content_type: Option<&'a str>,
    /// Visible text of the page
    pub text: &'a str,
    /// The browser rendered the response as a bare text document
    pub raw_document: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictReason {
    Empty,
    TooLarge,
    CodeContentType,
    RichDocument,
    SourceUrl,
    Detected,
    NotCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVerdict {
    pub is_code: bool,
    pub language: Option<String>,
    pub reason: VerdictReason,
}

impl PageVerdict {
    fn code(language: &str, reason: VerdictReason) -> Self {
        Self {
            is_code: true,
            language: Some(language.to_string()),
            reason,
        }
    }

    fn not_code(reason: VerdictReason) -> Self {
        Self {
            is_code: false,
            language: None,
            reason,
        }
    }
}

/// Classify a page.
pub fn classify_page(page: &PageInfo<'_>, detector: &LanguageDetector) -> PageVerdict {
    if page.text.trim().is_empty() {
        return PageVerdict::not_code(VerdictReason::Empty);
    }
    if page.text.len() > MAX_PAGE_BYTES {
        return PageVerdict::not_code(VerdictReason::TooLarge);
    }

    if let Some(language) = page.content_type.and_then(language_for_mime) {
        return PageVerdict::code(language, VerdictReason::CodeContentType);
    }

    if !page.raw_document {
        return PageVerdict::not_code(VerdictReason::RichDocument);
    }

    if let Some(language) = url_path(page.url).and_then(|path| LanguageResolver::new().from_path(path)) {
        return PageVerdict::code(language, VerdictReason::SourceUrl);
    }

    match detector.detect(page.text) {
        Some(detection) if looks_like_code(page.text) => PageVerdict::code(detection.language, VerdictReason::Detected),
        _ => PageVerdict::not_code(VerdictReason::NotCode),
    }
}

fn language_for_mime(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    if let Some(&(_, language)) = CODE_MIME_TYPES.iter().find(|(mime, _)| *mime == essence) {
        return Some(language);
    }
    if essence.ends_with("+json") {
        Some("json")
    } else if essence.ends_with("+xml") && essence != "application/xhtml+xml" {
        Some("xml")
    } else {
        None
    }
}

/// Path component of a URL, without scheme, host, query or fragment.
fn url_path(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.find('/').map(|i| &rest[i..])?;
    let path = path.split(['?', '#']).next().unwrap_or(path);
    (path.len() > 1).then_some(path)
}

/// True if enough non-blank lines look like source code rather than prose.
pub fn looks_like_code(text: &str) -> bool {
    let mut total = 0usize;
    let mut code = 0usize;

    for line in text.lines().filter(|l| !l.trim().is_empty()).take(MAX_INSPECTED_LINES) {
        total += 1;
        if is_code_line(line) {
            code += 1;
        }
    }

    total > 0 && code as f64 / total as f64 >= CODE_LINE_RATIO
}

fn is_code_line(line: &str) -> bool {
    let trimmed = line.trim();

    // Long sentences ending in a period read as prose.
    if trimmed.ends_with('.') && trimmed.split_whitespace().count() >= 6 {
        return false;
    }

    let indented = line.starts_with([' ', '\t']);
    let structural_end = trimmed.ends_with([';', '{', '}', '(', ')', '[', ']', ',', ':', '>']);
    let comment = ["//", "/*", "*", "#", "--", "<!--"].iter().any(|m| trimmed.starts_with(m));
    let operator = ["=", "=>", "->", "::", "&&", "||", "()"].iter().any(|op| trimmed.contains(op));

    indented || structural_end || comment || operator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(url: &'a str, content_type: Option<&'a str>, text: &'a str, raw: bool) -> PageInfo<'a> {
        PageInfo {
            url,
            content_type,
            text,
            raw_document: raw,
        }
    }

    fn classify(page: PageInfo<'_>) -> PageVerdict {
        classify_page(&page, &LanguageDetector::new())
    }

    #[test]
    fn test_code_mime_type_decides() {
        let verdict = classify(page(
            "https://api.example.com/v1/users",
            Some("application/json; charset=utf-8"),
            "[]",
            true,
        ));
        assert!(verdict.is_code);
        assert_eq!(verdict.language.as_deref(), Some("json"));
        assert_eq!(verdict.reason, VerdictReason::CodeContentType);

        let verdict = classify(page("https://x.test/feed", Some("application/atom+xml"), "<feed/>", true));
        assert_eq!(verdict.language.as_deref(), Some("xml"));
    }

    #[test]
    fn test_rich_document_is_never_code() {
        let verdict = classify(page(
            "https://blog.example.com/post.js",
            Some("text/html"),
            "const x = 1;\nconsole.log(x);",
            false,
        ));
        assert!(!verdict.is_code);
        assert_eq!(verdict.reason, VerdictReason::RichDocument);
    }

    #[test]
    fn test_source_url_extension() {
        let verdict = classify(page(
            "https://raw.example.com/repo/main/src/lib.rs?token=abc",
            Some("text/plain"),
            "anything at all",
            true,
        ));
        assert_eq!(verdict.language.as_deref(), Some("rust"));
        assert_eq!(verdict.reason, VerdictReason::SourceUrl);
    }

    #[test]
    fn test_detected_plain_text() {
        let code = "def add(a, b):\n    return a + b\n\nclass Point(object):\n    pass\n";
        let verdict = classify(page("https://paste.example.com/raw/abc123", Some("text/plain"), code, true));
        assert!(verdict.is_code);
        assert_eq!(verdict.language.as_deref(), Some("python"));
        assert_eq!(verdict.reason, VerdictReason::Detected);
    }

    #[test]
    fn test_prose_is_not_code() {
        let prose = "This is a perfectly ordinary paragraph of text about nothing.\n\
                     It continues here with another sentence that has no code in it.\n\
                     We could print( something but we will not do that today.\n";
        let verdict = classify(page("https://example.com/notes", Some("text/plain"), prose, true));
        assert!(!verdict.is_code);
        assert!(!looks_like_code(prose));
    }

    #[test]
    fn test_empty_and_oversized() {
        assert_eq!(classify(page("https://x.test/a.js", None, "  \n", true)).reason, VerdictReason::Empty);

        let big = "x".repeat(MAX_PAGE_BYTES + 1);
        assert_eq!(classify(page("https://x.test/a.js", None, &big, true)).reason, VerdictReason::TooLarge);
    }

    #[test]
    fn test_url_path_extraction() {
        assert_eq!(url_path("https://host/a/b.py#L10"), Some("/a/b.py"));
        assert_eq!(url_path("https://host/"), None);
        assert_eq!(url_path("https://host"), None);
    }
}

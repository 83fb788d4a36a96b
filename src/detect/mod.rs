//! Language detection for raw text.
//!
//! Every pattern in the weighted table that matches the text adds its
//! weight to its language. A language is only a candidate when the
//! evidence is corroborated: at least two distinct patterns matched, or
//! the summed weight reaches [`STRONG_EVIDENCE`]. Among candidates the
//! highest score wins, then the larger number of matched patterns, then
//! the language listed first in the table.
//!
//! Input that parses as a JSON object or array is classified as JSON
//! before any pattern runs.

pub mod page;
pub mod patterns;

pub use page::{PageInfo, PageVerdict, VerdictReason, classify_page, looks_like_code};
pub use patterns::{DetectionPattern, PATTERNS};

use crate::language::LanguageResolver;
use serde::Serialize;
use std::collections::HashMap;

/// Only this many leading bytes are examined.
pub const SAMPLE_BYTES: usize = 64 * 1024;

/// Summed weight that makes a single pattern match sufficient.
pub const STRONG_EVIDENCE: u32 = 8;

/// Minimum distinct patterns for a corroborated match.
pub const MIN_CORROBORATING_PATTERNS: usize = 2;

/// How a detection was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionSource {
    Extension,
    Structure,
    Patterns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub language: &'static str,
    /// Summed weight of the matched patterns
    pub score: u32,
    /// Number of distinct patterns that matched
    pub matched_patterns: usize,
    pub source: DetectionSource,
}

impl Detection {
    /// Whether the evidence is strong enough to accept.
    pub fn is_candidate(&self) -> bool {
        match self.source {
            DetectionSource::Extension | DetectionSource::Structure => true,
            DetectionSource::Patterns => {
                self.matched_patterns >= MIN_CORROBORATING_PATTERNS || self.score >= STRONG_EVIDENCE
            }
        }
    }
}

/// Weighted pattern classifier.
#[derive(Debug, Clone, Copy)]
pub struct LanguageDetector {
    patterns: &'static [DetectionPattern],
    resolver: LanguageResolver,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self {
            patterns: PATTERNS.as_slice(),
            resolver: LanguageResolver::new(),
        }
    }

    /// Classify `text`, returning `None` when no language has
    /// corroborated evidence.
    pub fn detect(&self, text: &str) -> Option<Detection> {
        let sample = sample(text);
        if sample.trim().is_empty() {
            return None;
        }
        if is_structural_json(sample) {
            return Some(Detection {
                language: "json",
                score: 0,
                matched_patterns: 0,
                source: DetectionSource::Structure,
            });
        }
        self.scores(sample).into_iter().find(Detection::is_candidate)
    }

    /// Per-language evidence for every language with at least one match,
    /// best first. Includes languages that are not candidates.
    pub fn scores(&self, text: &str) -> Vec<Detection> {
        let sample = sample(text);
        // language -> (score, patterns, first table index)
        let mut totals: HashMap<&'static str, (u32, usize, usize)> = HashMap::new();

        for (index, pattern) in self.patterns.iter().enumerate() {
            if pattern.regex.is_match(sample) {
                let entry = totals.entry(pattern.language).or_insert((0, 0, index));
                entry.0 += pattern.weight;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(usize, Detection)> = totals
            .into_iter()
            .map(|(language, (score, matched_patterns, order))| {
                (
                    order,
                    Detection {
                        language,
                        score,
                        matched_patterns,
                        source: DetectionSource::Patterns,
                    },
                )
            })
            .collect();

        ranked.sort_by(|(a_order, a), (b_order, b)| {
            b.score
                .cmp(&a.score)
                .then(b.matched_patterns.cmp(&a.matched_patterns))
                .then(a_order.cmp(b_order))
        });
        ranked.into_iter().map(|(_, detection)| detection).collect()
    }

    /// Classify a named file: a recognized extension or file name wins,
    /// otherwise the content decides.
    pub fn detect_file(&self, file_name: &str, content: &str) -> Option<Detection> {
        if let Some(language) = self.resolver.from_path(file_name) {
            return Some(Detection {
                language,
                score: 0,
                matched_patterns: 0,
                source: DetectionSource::Extension,
            });
        }
        self.detect(content)
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Leading slice of at most [`SAMPLE_BYTES`], cut on a char boundary.
fn sample(text: &str) -> &str {
    if text.len() <= SAMPLE_BYTES {
        return text;
    }
    let mut end = SAMPLE_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn is_structural_json(text: &str) -> bool {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    matches!(
        serde_json::from_str::<serde_json::Value>(trimmed),
        Ok(serde_json::Value::Object(_) | serde_json::Value::Array(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<&'static str> {
        LanguageDetector::new().detect(text).map(|d| d.language)
    }

    #[test]
    fn test_structural_json_wins_outright() {
        let detection = LanguageDetector::new().detect(r#"{"name": "x", "tags": [1, 2]}"#).unwrap();
        assert_eq!(detection.language, "json");
        assert_eq!(detection.source, DetectionSource::Structure);
        // A bare scalar is not a JSON document worth formatting.
        assert_ne!(detect("42"), Some("json"));
    }

    #[test]
    fn test_python_snippet() {
        let code = "import os\n\ndef main():\n    print(os.getcwd())\n\nif __name__ == '__main__':\n    main()\n";
        assert_eq!(detect(code), Some("python"));
    }

    #[test]
    fn test_rust_snippet() {
        let code = "use std::fmt;\n\nfn main() {\n    let mut v = vec![1];\n    println!(\"{v:?}\");\n}\n";
        assert_eq!(detect(code), Some("rust"));
    }

    #[test]
    fn test_single_weak_match_is_not_enough() {
        // Only `print(` matches, weight 2, one pattern.
        assert_eq!(detect("please print( this"), None);
        let scores = LanguageDetector::new().scores("please print( this");
        assert_eq!(scores[0].language, "python");
        assert!(!scores[0].is_candidate());
    }

    #[test]
    fn test_single_strong_match_is_enough() {
        assert_eq!(detect("<?php"), Some("php"));
    }

    #[test]
    fn test_ties_prefer_more_patterns_then_table_order() {
        let detector = LanguageDetector::new();
        let scores = detector.scores("const x = 1;\nconsole.log(x);");
        let js = scores.iter().find(|d| d.language == "javascript").unwrap();
        assert_eq!(js.matched_patterns, 2);
        assert_eq!(scores[0].language, "javascript");
    }

    #[test]
    fn test_detect_file_prefers_extension() {
        let detector = LanguageDetector::new();
        let detection = detector.detect_file("build.rs", "print('not rust')").unwrap();
        assert_eq!(detection.language, "rust");
        assert_eq!(detection.source, DetectionSource::Extension);

        let detection = detector.detect_file("notes", "<!DOCTYPE html><html></html>").unwrap();
        assert_eq!(detection.language, "html");
    }

    #[test]
    fn test_sample_respects_char_boundaries() {
        let text = "é".repeat(SAMPLE_BYTES);
        let s = sample(&text);
        assert!(s.len() <= SAMPLE_BYTES);
        assert!(s.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_blank_text() {
        assert_eq!(detect("   \n\t"), None);
    }
}

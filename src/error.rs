//! Failure taxonomy shared by the registry, the backends and the dispatch layer.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Category of a formatting failure.
///
/// Every failure surfaced to a caller carries exactly one kind, so callers
/// can branch on it instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatErrorKind {
    /// Input exceeded the configured maximum size.
    OversizedInput,
    /// No backend is bound for the normalized language.
    UnsupportedLanguage,
    /// The caller exceeded its request quota for the current window.
    RateLimited,
    /// The chosen backend reported itself unavailable.
    BackendUnavailable,
    /// Loading a plugin or instantiating a binary module failed.
    BackendLoadFailure,
    /// The backend's own formatting logic failed.
    BackendFormatFailure,
    /// Malformed settings or request shape.
    InvalidInput,
}

impl FormatErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OversizedInput => "oversized-input",
            Self::UnsupportedLanguage => "unsupported-language",
            Self::RateLimited => "rate-limited",
            Self::BackendUnavailable => "backend-unavailable",
            Self::BackendLoadFailure => "backend-load-failure",
            Self::BackendFormatFailure => "backend-format-failure",
            Self::InvalidInput => "invalid-input",
        }
    }
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable formatting failure with a human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct FormatError {
    pub kind: FormatErrorKind,
    pub message: String,
}

impl FormatError {
    pub fn new(kind: FormatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn oversized(len: usize, max: usize) -> Self {
        Self::new(
            FormatErrorKind::OversizedInput,
            format!("Input is {len} bytes, which exceeds the {max} byte limit"),
        )
    }

    pub fn unsupported(language: &str) -> Self {
        Self::new(
            FormatErrorKind::UnsupportedLanguage,
            format!("No formatter available for language '{language}'"),
        )
    }

    pub fn rate_limited(max_requests: u32, window_ms: u128) -> Self {
        Self::new(
            FormatErrorKind::RateLimited,
            format!("Too many format requests (limit is {max_requests} per {window_ms}ms)"),
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::BackendUnavailable, message)
    }

    pub fn load_failure(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::BackendLoadFailure, message)
    }

    pub fn format_failure(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::BackendFormatFailure, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::InvalidInput, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_message() {
        let err = FormatError::unsupported("cobol");
        assert_eq!(err.to_string(), "No formatter available for language 'cobol'");
        assert_eq!(err.kind, FormatErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FormatErrorKind::RateLimited.to_string(), "rate-limited");
        assert_eq!(
            serde_json::to_string(&FormatErrorKind::BackendLoadFailure).unwrap(),
            "\"backend-load-failure\""
        );
    }

    #[test]
    fn test_oversized_message_mentions_limit() {
        let err = FormatError::oversized(2048, 1024);
        assert!(err.message.contains("2048"));
        assert!(err.message.contains("1024"));
    }
}

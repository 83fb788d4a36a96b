//! Formatter backends and the registry that dispatches to them.
//!
//! # Overview
//!
//! A backend implements [`Formatter`]: it declares the languages it handles
//! in its [`FormatterMetadata`] and formats code for them. Backends come in
//! three shapes:
//!
//! - **Always-ready** backends such as [`BeautifyFormatter`] and
//!   [`FallbackFormatter`] run in-process with no setup cost.
//! - **Lazy-plugin** backends ([`PluginFormatter`]) load one or more plugins
//!   on first use for a language and keep them for the life of the process.
//! - **Binary-module** backends ([`WasmFormatter`]) instantiate a compiled
//!   module through a [`WasmHost`] before their first format call.
//!
//! The [`FormatterRegistry`] wraps every backend in a [`GuardedFormatter`]
//! when it is registered, so callers always get a [`FormatResult`] back and
//! never an error or a panic.
//!
//! # Registration order
//!
//! When two backends declare the same language, the one registered last
//! wins. [`FormatterRegistry::with_builtin_backends`] therefore registers
//! generic beautifiers first, opinionated formatters after them, and the
//! catch-all fallback last of all (bound only to languages nothing else
//! claimed).

pub mod beautify;
pub mod fallback;
pub mod guard;
pub mod memo;
pub mod plugin;
pub mod registry;
pub mod wasm;

pub use beautify::BeautifyFormatter;
pub use fallback::FallbackFormatter;
pub use guard::GuardedFormatter;
pub use memo::AsyncMemo;
pub use plugin::{BuiltinPluginLoader, FormatPlugin, PluginFormatter, PluginLoader};
pub use registry::FormatterRegistry;
pub use wasm::{ModuleCache, NoBinaryModules, WasmArtifact, WasmFormatter, WasmHost, WasmModule};

use crate::error::FormatError;
use crate::settings::FormatterSettings;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a format request.
///
/// On failure `code` holds the original input, so callers can always show
/// something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    pub code: String,
    pub error: Option<FormatError>,
}

impl FormatResult {
    pub fn success(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: None,
        }
    }

    /// A failed result that carries the caller's original input verbatim.
    pub fn failure(original: &str, error: FormatError) -> Self {
        Self {
            code: original.to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Static descriptor owned by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterMetadata {
    /// Stable identifier, also the registry key
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Languages the backend declares support for (canonical ids or aliases)
    pub languages: Vec<String>,
    /// Enforces one canonical style rather than best-effort beautification
    pub is_formatter: bool,
    /// Does not preserve the original stylistic choices
    pub is_opinionated: bool,
    /// Attempts output on malformed input instead of failing
    pub tolerant: bool,
}

impl FormatterMetadata {
    pub fn new(id: &str, name: &str, languages: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            is_formatter: false,
            is_opinionated: false,
            tolerant: false,
        }
    }

    pub fn formatter(mut self, value: bool) -> Self {
        self.is_formatter = value;
        self
    }

    pub fn opinionated(mut self, value: bool) -> Self {
        self.is_opinionated = value;
        self
    }

    pub fn tolerant(mut self, value: bool) -> Self {
        self.tolerant = value;
        self
    }
}

/// A formatting backend.
///
/// Implementations may return errors freely; the registry wraps every
/// backend in a [`GuardedFormatter`] which converts errors and panics into
/// failed [`FormatResult`]s.
#[async_trait]
pub trait Formatter: Send + Sync {
    fn metadata(&self) -> &FormatterMetadata;

    /// Cheap synchronous probe; `false` short-circuits a format attempt.
    fn is_available(&self) -> bool {
        true
    }

    /// Format `code` written in the canonical `language`.
    async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;

    #[test]
    fn test_failure_keeps_original_code() {
        let result = FormatResult::failure("{\"a\":", FormatError::format_failure("EOF while parsing"));
        assert!(!result.is_success());
        assert_eq!(result.code, "{\"a\":");
        assert_eq!(result.error_message(), Some("EOF while parsing"));
        assert_eq!(result.error.map(|e| e.kind), Some(FormatErrorKind::BackendFormatFailure));
    }

    #[test]
    fn test_metadata_builder() {
        let meta = FormatterMetadata::new("x", "X", &["json"])
            .formatter(true)
            .opinionated(true)
            .tolerant(false);
        assert!(meta.is_formatter);
        assert!(meta.is_opinionated);
        assert!(!meta.tolerant);
        assert_eq!(meta.languages, vec!["json"]);
    }
}

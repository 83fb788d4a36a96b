//! Binary-module backends.
//!
//! A [`WasmFormatter`] delegates to a compiled module that a [`WasmHost`]
//! instantiates from two artifacts, a thin loader and the binary itself,
//! both resolved against a base location. Instantiation happens once per
//! (loader, binary) pair for the whole process: every formatter shares one
//! [`ModuleCache`], and concurrent first requests await the same
//! instantiation.

use super::{AsyncMemo, Formatter, FormatterMetadata};
use crate::error::FormatError;
use crate::settings::{FormatterSettings, QuoteStyle};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// An instantiated module.
pub trait WasmModule: Send + Sync {
    /// Format `code` with the module's own option object.
    fn format(&self, code: &str, options: &Value) -> Result<String, String>;
}

/// Execution environment able to run compiled modules.
#[async_trait]
pub trait WasmHost: Send + Sync {
    /// Capability probe, checked before every format attempt.
    fn supports_binary_modules(&self) -> bool;

    /// Load `loader_url` and initialize it with `binary_url`.
    async fn instantiate(&self, loader_url: &str, binary_url: &str) -> Result<Arc<dyn WasmModule>, String>;
}

/// Host for environments without a module runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBinaryModules;

#[async_trait]
impl WasmHost for NoBinaryModules {
    fn supports_binary_modules(&self) -> bool {
        false
    }

    async fn instantiate(&self, loader_url: &str, _binary_url: &str) -> Result<Arc<dyn WasmModule>, String> {
        Err(format!("Cannot load {loader_url}: binary modules are not supported here"))
    }
}

/// The two files that make up a binary-module formatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WasmArtifact {
    pub loader: String,
    pub binary: String,
}

impl WasmArtifact {
    pub fn new(loader: &str, binary: &str) -> Self {
        Self {
            loader: loader.to_string(),
            binary: binary.to_string(),
        }
    }

    fn cache_key(&self) -> (String, String) {
        (self.loader.clone(), self.binary.clone())
    }

    /// Loader and binary locations under `base`.
    pub fn urls(&self, base: &str) -> (String, String) {
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return (self.loader.clone(), self.binary.clone());
        }
        (format!("{base}/{}", self.loader), format!("{base}/{}", self.binary))
    }
}

/// Process-wide instantiated modules keyed by (loader id, binary id).
pub type ModuleCache = AsyncMemo<(String, String), Arc<dyn WasmModule>>;

pub struct WasmFormatter {
    metadata: FormatterMetadata,
    artifact: WasmArtifact,
    base: String,
    host: Arc<dyn WasmHost>,
    modules: Arc<ModuleCache>,
    options: fn(&FormatterSettings) -> Value,
}

impl WasmFormatter {
    pub fn new(
        metadata: FormatterMetadata,
        artifact: WasmArtifact,
        base: &str,
        host: Arc<dyn WasmHost>,
        modules: Arc<ModuleCache>,
        options: fn(&FormatterSettings) -> Value,
    ) -> Self {
        Self {
            metadata,
            artifact,
            base: base.to_string(),
            host,
            modules,
            options,
        }
    }

    /// Python formatter.
    pub fn ruff(host: Arc<dyn WasmHost>, modules: Arc<ModuleCache>, base: &str) -> Self {
        Self::new(
            FormatterMetadata::new("ruff", "Ruff", &["python"])
                .formatter(true)
                .opinionated(true)
                .tolerant(false),
            WasmArtifact::new("ruff_fmt.js", "ruff_fmt_bg.wasm"),
            base,
            host,
            modules,
            ruff_options,
        )
    }

    /// TOML formatter.
    pub fn taplo(host: Arc<dyn WasmHost>, modules: Arc<ModuleCache>, base: &str) -> Self {
        Self::new(
            FormatterMetadata::new("taplo", "Taplo", &["toml"])
                .formatter(true)
                .opinionated(false)
                .tolerant(false),
            WasmArtifact::new("taplo_fmt.js", "taplo_fmt_bg.wasm"),
            base,
            host,
            modules,
            taplo_options,
        )
    }

    pub fn artifact(&self) -> &WasmArtifact {
        &self.artifact
    }

    async fn module(&self) -> Result<Arc<dyn WasmModule>, FormatError> {
        let key = self.artifact.cache_key();
        let (loader_url, binary_url) = self.artifact.urls(&self.base);
        self.modules
            .get_or_try_init(&key, || async {
                log::debug!("Instantiating {loader_url} with {binary_url}");
                self.host.instantiate(&loader_url, &binary_url).await
            })
            .await
            .map_err(|e| {
                log::warn!("Failed to instantiate '{}': {e}", self.metadata.id);
                FormatError::load_failure(format!("Failed to initialize {}: {e}", self.metadata.name))
            })
    }
}

#[async_trait]
impl Formatter for WasmFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        &self.metadata
    }

    fn is_available(&self) -> bool {
        self.host.supports_binary_modules()
    }

    async fn format(&self, code: &str, _language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let module = self.module().await?;
        let options = (self.options)(settings);
        module
            .format(code, &options)
            .map_err(|e| FormatError::format_failure(format!("{} failed: {e}", self.metadata.name)))
    }
}

/// Ruff caps the line width at 320.
fn ruff_options(settings: &FormatterSettings) -> Value {
    json!({
        "indent_style": if settings.use_tabs { "tab" } else { "space" },
        "indent_width": settings.indent_columns(),
        "line_width": settings.line_wrap.effective_limit().min(320),
        "quote_style": match settings.quote_style {
            QuoteStyle::Double => "double",
            QuoteStyle::Single => "single",
        },
    })
}

fn taplo_options(settings: &FormatterSettings) -> Value {
    json!({
        "indent_string": settings.indent_unit(),
        "align_entries": settings.align_entries,
        "align_comments": settings.align_comments,
        "indent_tables": settings.indent_tables,
        "column_width": settings.line_wrap.effective_limit().min(u32::MAX as usize),
        "trailing_newline": true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct Trim;

    impl WasmModule for Trim {
        fn format(&self, code: &str, options: &Value) -> Result<String, String> {
            if code.contains("syntax error") {
                return Err("unexpected token".to_string());
            }
            Ok(format!("{}|{}", code.trim(), options["indent_width"]))
        }
    }

    struct FakeHost {
        instantiations: AtomicUsize,
        fail: AtomicBool,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl FakeHost {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                instantiations: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WasmHost for FakeHost {
        fn supports_binary_modules(&self) -> bool {
            true
        }

        async fn instantiate(&self, loader_url: &str, binary_url: &str) -> Result<Arc<dyn WasmModule>, String> {
            self.instantiations.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((loader_url.to_string(), binary_url.to_string()));
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err("404 Not Found".to_string());
            }
            Ok(Arc::new(Trim))
        }
    }

    #[tokio::test]
    async fn test_module_instantiated_once_for_concurrent_requests() {
        let host = FakeHost::new();
        let modules = Arc::new(ModuleCache::new());
        let ruff = Arc::new(WasmFormatter::ruff(host.clone(), modules.clone(), "ext/wasm/"));
        let settings = FormatterSettings::for_language("python");

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let ruff = Arc::clone(&ruff);
                tokio::spawn(async move { ruff.format("  x = 1  ", "python", &settings).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "x = 1|4");
        }

        assert_eq!(host.instantiations.load(Ordering::SeqCst), 1);
        assert_eq!(
            host.seen.lock().unwrap()[0],
            ("ext/wasm/ruff_fmt.js".to_string(), "ext/wasm/ruff_fmt_bg.wasm".to_string())
        );

        // A second formatter over the same cache reuses the module.
        let again = WasmFormatter::ruff(host.clone(), modules, "ext/wasm");
        again.format("y", "python", &settings).await.unwrap();
        assert_eq!(host.instantiations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_instantiation_failure_is_load_failure_and_retried() {
        let host = FakeHost::new();
        host.fail.store(true, Ordering::SeqCst);
        let taplo = WasmFormatter::taplo(host.clone(), Arc::new(ModuleCache::new()), "");
        let settings = FormatterSettings::for_language("toml");

        let err = taplo.format("a=1", "toml", &settings).await.unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::BackendLoadFailure);
        assert!(err.message.contains("404"));

        host.fail.store(false, Ordering::SeqCst);
        assert!(taplo.format("a=1", "toml", &settings).await.is_ok());
        assert_eq!(host.instantiations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_module_error_is_format_failure() {
        let ruff = WasmFormatter::ruff(FakeHost::new(), Arc::new(ModuleCache::new()), "wasm");
        let err = ruff
            .format("syntax error", "python", &FormatterSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::BackendFormatFailure);
    }

    #[test]
    fn test_default_host_reports_no_capability() {
        let ruff = WasmFormatter::ruff(Arc::new(NoBinaryModules), Arc::new(ModuleCache::new()), "wasm");
        assert!(!ruff.is_available());
    }

    #[test]
    fn test_option_translation() {
        let mut settings = FormatterSettings::for_language("python");
        settings.use_tabs = true;
        settings.quote_style = QuoteStyle::Single;
        let ruff = ruff_options(&settings);
        assert_eq!(ruff["indent_style"], "tab");
        assert_eq!(ruff["line_width"], 88);
        assert_eq!(ruff["quote_style"], "single");

        let taplo = taplo_options(&FormatterSettings::for_language("toml"));
        assert_eq!(taplo["indent_string"], "  ");
        assert_eq!(taplo["align_comments"], true);
    }
}

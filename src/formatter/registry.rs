//! Language -> backend bindings.

use super::{
    BeautifyFormatter, FallbackFormatter, FormatResult, Formatter, GuardedFormatter, ModuleCache, PluginFormatter,
    PluginLoader, WasmFormatter, WasmHost,
};
use crate::error::FormatError;
use crate::language::LanguageResolver;
use crate::settings::FormatterSettings;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Registry of formatter backends.
///
/// Each canonical language is bound to at most one backend id. Registering
/// a backend rebinds every language it declares, so the most recently
/// registered backend for a language wins. Registering again under an id
/// that is already taken replaces that backend and all of its bindings.
pub struct FormatterRegistry {
    /// Backend id -> guarded backend
    backends: HashMap<String, GuardedFormatter>,
    /// Canonical language -> backend id
    bindings: BTreeMap<String, String>,
    resolver: LanguageResolver,
}

impl FormatterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            bindings: BTreeMap::new(),
            resolver: LanguageResolver::new(),
        }
    }

    /// Registry with the built-in backends, in this order:
    ///
    /// 1. `beautify`: tolerant beautifier for scripts, styles, JSON and markup
    /// 2. `plugins`: opinionated JSON, YAML and SQL formatters
    /// 3. `ruff` (python) and `taplo` (toml), backed by binary modules
    /// 4. `fallback`: whitespace normalizer for every language still unbound
    pub fn with_builtin_backends(host: Arc<dyn WasmHost>, loader: Arc<dyn PluginLoader>, wasm_base: &str) -> Self {
        let modules = Arc::new(ModuleCache::new());
        let mut registry = Self::new();
        registry.register(Arc::new(BeautifyFormatter::new()));
        registry.register(Arc::new(PluginFormatter::new(loader)));
        registry.register(Arc::new(WasmFormatter::ruff(Arc::clone(&host), Arc::clone(&modules), wasm_base)));
        registry.register(Arc::new(WasmFormatter::taplo(host, modules, wasm_base)));
        registry.register_fallback(Arc::new(FallbackFormatter::new()));
        registry
    }

    /// Add a backend and bind it to every language it declares, replacing
    /// existing bindings.
    pub fn register(&mut self, backend: Arc<dyn Formatter>) {
        let id = backend.metadata().id.clone();
        self.unbind(&id);
        let languages: Vec<String> = backend
            .metadata()
            .languages
            .iter()
            .map(|lang| self.resolver.resolve(lang))
            .collect();

        for language in languages {
            if let Some(previous) = self.bindings.insert(language.clone(), id.clone())
                && previous != id
            {
                log::debug!("Formatter '{id}' overrides '{previous}' for {language}");
            }
        }
        self.backends.insert(id, GuardedFormatter::new(backend));
    }

    /// Add a backend and bind it only to the declared languages that no
    /// other backend claims yet.
    pub fn register_fallback(&mut self, backend: Arc<dyn Formatter>) {
        let id = backend.metadata().id.clone();
        self.unbind(&id);
        let mut bound = 0usize;
        for lang in &backend.metadata().languages {
            let language = self.resolver.resolve(lang);
            self.bindings.entry(language).or_insert_with(|| {
                bound += 1;
                id.clone()
            });
        }
        log::debug!("Fallback formatter '{id}' bound to {bound} languages");
        self.backends.insert(id, GuardedFormatter::new(backend));
    }

    /// Forget a previously registered backend under `id` and its bindings.
    fn unbind(&mut self, id: &str) {
        if self.backends.remove(id).is_some() {
            let before = self.bindings.len();
            self.bindings.retain(|_, bound| bound != id);
            log::debug!("Formatter '{id}' re-registered, dropped {} bindings", before - self.bindings.len());
        }
    }

    /// The backend bound to `language` (any alias), if any.
    pub fn get_formatter_for(&self, language: &str) -> Option<&GuardedFormatter> {
        let language = self.resolver.resolve(language);
        self.bindings.get(&language).and_then(|id| self.backends.get(id))
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.get_formatter_for(language).is_some()
    }

    /// Snapshot of the bound canonical languages, sorted.
    pub fn supported_languages(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    /// Every registered backend, sorted by id.
    pub fn formatters(&self) -> Vec<&GuardedFormatter> {
        let mut all: Vec<&GuardedFormatter> = self.backends.values().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Format with the bound backend. The backend's result is returned as is.
    pub async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> FormatResult {
        let canonical = self.resolver.resolve(language);
        match self.get_formatter_for(&canonical) {
            Some(backend) => backend.format(code, &canonical, settings).await,
            None => FormatResult::failure(code, FormatError::unsupported(&canonical)),
        }
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;
    use crate::formatter::{BuiltinPluginLoader, FormatterMetadata, NoBinaryModules};
    use async_trait::async_trait;

    struct Named(FormatterMetadata);

    #[async_trait]
    impl Formatter for Named {
        fn metadata(&self) -> &FormatterMetadata {
            &self.0
        }

        async fn format(&self, _code: &str, _language: &str, _settings: &FormatterSettings) -> Result<String, FormatError> {
            Ok(self.0.id.clone())
        }
    }

    fn named(id: &str, languages: &[&str]) -> Arc<dyn Formatter> {
        Arc::new(Named(FormatterMetadata::new(id, id, languages)))
    }

    fn builtin() -> FormatterRegistry {
        FormatterRegistry::with_builtin_backends(Arc::new(NoBinaryModules), Arc::new(BuiltinPluginLoader), "wasm")
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = FormatterRegistry::new();
        registry.register(named("a", &["json"]));
        registry.register(named("b", &["json"]));
        assert_eq!(registry.get_formatter_for("json").map(|f| f.id()), Some("b"));
        // Both backends remain registered.
        assert_eq!(registry.formatters().len(), 2);
    }

    #[test]
    fn test_reregistering_an_id_drops_its_old_languages() {
        let mut registry = FormatterRegistry::new();
        registry.register(named("a", &["json", "yaml"]));
        registry.register(named("a", &["json"]));
        assert_eq!(registry.get_formatter_for("json").map(|f| f.id()), Some("a"));
        assert!(!registry.is_supported("yaml"));
        assert_eq!(registry.supported_languages(), vec!["json"]);
        assert_eq!(registry.formatters().len(), 1);
    }

    #[test]
    fn test_declared_aliases_are_normalized() {
        let mut registry = FormatterRegistry::new();
        registry.register(named("js", &["JS"]));
        assert!(registry.is_supported("js"));
        assert!(registry.is_supported("JS"));
        assert!(registry.is_supported("javascript"));
        assert_eq!(registry.supported_languages(), vec!["javascript"]);
    }

    #[test]
    fn test_fallback_does_not_override() {
        let mut registry = FormatterRegistry::new();
        registry.register(named("real", &["rust"]));
        registry.register_fallback(named("fallback", &["rust", "go"]));
        assert_eq!(registry.get_formatter_for("rs").map(|f| f.id()), Some("real"));
        assert_eq!(registry.get_formatter_for("go").map(|f| f.id()), Some("fallback"));
    }

    #[test]
    fn test_builtin_bindings() {
        let registry = builtin();
        let id = |lang: &str| registry.get_formatter_for(lang).map(|f| f.id().to_string());

        assert_eq!(id("javascript").as_deref(), Some("beautify"));
        assert_eq!(id("css").as_deref(), Some("beautify"));
        assert_eq!(id("json").as_deref(), Some("plugins"));
        assert_eq!(id("yml").as_deref(), Some("plugins"));
        assert_eq!(id("py").as_deref(), Some("ruff"));
        assert_eq!(id("toml").as_deref(), Some("taplo"));
        assert_eq!(id("golang").as_deref(), Some("fallback"));
        assert!(!registry.is_supported("cobol"));
    }

    #[tokio::test]
    async fn test_unbound_language_fails_with_original_code() {
        let registry = builtin();
        let result = registry
            .format("IDENTIFICATION DIVISION.", "cobol", &FormatterSettings::default())
            .await;
        assert_eq!(result.code, "IDENTIFICATION DIVISION.");
        assert_eq!(result.error.map(|e| e.kind), Some(FormatErrorKind::UnsupportedLanguage));
    }

    #[tokio::test]
    async fn test_format_passes_canonical_language() {
        let registry = builtin();
        let result = registry
            .format("{\"a\":1}", "JSON", &FormatterSettings::for_language("json"))
            .await;
        assert_eq!(result.code, "{\n  \"a\": 1\n}\n");
    }
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use codeview_lib::dispatch::{FormatService, ServiceConfig};
use codeview_lib::error::FormatError;
use codeview_lib::formatter::{
    BuiltinPluginLoader, FormatResult, Formatter, FormatterMetadata, FormatterRegistry, NoBinaryModules,
};
use codeview_lib::rate_limit::RateLimiter;
use codeview_lib::settings::FormatterSettings;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delegates to another backend and counts how often it is called.
pub struct CountingFormatter {
    inner: Arc<dyn Formatter>,
    calls: AtomicUsize,
}

impl CountingFormatter {
    pub fn wrap(inner: Arc<dyn Formatter>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Formatter for CountingFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        self.inner.metadata()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.format(code, language, settings).await
    }
}

/// Backend that always fails or panics, for the guard tests.
pub struct BrokenFormatter {
    metadata: FormatterMetadata,
    panics: bool,
}

impl BrokenFormatter {
    pub fn failing(languages: &[&str]) -> Self {
        Self {
            metadata: FormatterMetadata::new("broken", "Broken", languages),
            panics: false,
        }
    }

    pub fn panicking(languages: &[&str]) -> Self {
        Self {
            metadata: FormatterMetadata::new("broken", "Broken", languages),
            panics: true,
        }
    }
}

#[async_trait]
impl Formatter for BrokenFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        &self.metadata
    }

    async fn format(&self, _code: &str, _language: &str, _settings: &FormatterSettings) -> Result<String, FormatError> {
        if self.panics {
            panic!("backend exploded");
        }
        Err(FormatError::format_failure("backend refused"))
    }
}

pub fn builtin_registry() -> FormatterRegistry {
    FormatterRegistry::with_builtin_backends(Arc::new(NoBinaryModules), Arc::new(BuiltinPluginLoader), "wasm")
}

pub fn builtin_service(config: ServiceConfig) -> FormatService {
    FormatService::new(Arc::new(builtin_registry()), config)
}

/// Built-in service with `extra` registered last, so it wins its languages.
pub fn service_with(extra: Arc<dyn Formatter>, config: ServiceConfig) -> FormatService {
    let mut registry = builtin_registry();
    registry.register(extra);
    FormatService::new(Arc::new(registry), config)
}

pub fn service_with_limiter(extra: Arc<dyn Formatter>, config: ServiceConfig, limiter: RateLimiter) -> FormatService {
    let mut registry = builtin_registry();
    registry.register(extra);
    FormatService::with_limiter(Arc::new(registry), config, limiter)
}

pub fn assert_failed_unchanged(result: &FormatResult, original: &str) {
    assert_eq!(result.code, original);
    assert!(result.error.is_some(), "expected a failure, got {:?}", result.code);
}

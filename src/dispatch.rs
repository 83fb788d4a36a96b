//! The single entry point for format requests.
//!
//! [`FormatService`] wraps the registry with the policy no backend should
//! implement itself. Every request runs the same stages in order:
//!
//! 1. rate limit (per caller)
//! 2. input size check
//! 3. supported-language check
//! 4. settings resolution
//! 5. cache key computation
//! 6. cache lookup; a hit returns without touching any backend
//! 7. backend call through the registry
//! 8. cache write, only on success
//!
//! Every outcome is a [`FormatResult`]; failures carry the original code.
//! Identical concurrent cache misses are not coalesced, so both may reach
//! the backend.

use crate::cache::{CacheStats, DEFAULT_CAPACITY, FormatCache};
use crate::error::FormatError;
use crate::formatter::{FormatResult, FormatterRegistry};
use crate::language::normalize_language;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::settings::{RawSettings, resolve};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Caller id used by [`FormatService::format_code`].
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Default maximum input size (1 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub max_input_bytes: usize,
    pub cache_capacity: usize,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            cache_capacity: DEFAULT_CAPACITY,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

pub struct FormatService {
    registry: Arc<FormatterRegistry>,
    cache: Mutex<FormatCache>,
    limiter: RateLimiter,
    config: ServiceConfig,
}

impl FormatService {
    pub fn new(registry: Arc<FormatterRegistry>, config: ServiceConfig) -> Self {
        Self::with_limiter(registry, config, RateLimiter::new(config.rate_limit))
    }

    /// Use a preconfigured limiter, e.g. one driven by a manual clock.
    pub fn with_limiter(registry: Arc<FormatterRegistry>, config: ServiceConfig, limiter: RateLimiter) -> Self {
        Self {
            registry,
            cache: Mutex::new(FormatCache::new(config.cache_capacity)),
            limiter,
            config,
        }
    }

    pub fn config(&self) -> ServiceConfig {
        self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Format on behalf of the anonymous caller.
    pub async fn format_code(&self, code: &str, language: &str, settings: &RawSettings) -> FormatResult {
        self.format_code_as(ANONYMOUS_CALLER, code, language, settings).await
    }

    /// Format with settings given as an untyped key-value bag.
    pub async fn format_code_value(
        &self,
        caller: &str,
        code: &str,
        language: &str,
        settings: &serde_json::Value,
    ) -> FormatResult {
        match RawSettings::from_value(settings) {
            Ok(raw) => self.format_code_as(caller, code, language, &raw).await,
            Err(err) => {
                // Still counts against the caller's quota.
                if let Err(limited) = self.limiter.check(caller) {
                    return FormatResult::failure(code, limited);
                }
                FormatResult::failure(code, err)
            }
        }
    }

    pub async fn format_code_as(&self, caller: &str, code: &str, language: &str, settings: &RawSettings) -> FormatResult {
        if let Err(err) = self.limiter.check(caller) {
            return FormatResult::failure(code, err);
        }

        if code.len() > self.config.max_input_bytes {
            log::debug!("Rejecting {} byte input for {language}", code.len());
            return FormatResult::failure(code, FormatError::oversized(code.len(), self.config.max_input_bytes));
        }

        let language = normalize_language(language);
        if !self.registry.is_supported(&language) {
            return FormatResult::failure(code, FormatError::unsupported(&language));
        }

        let settings = resolve(settings, &language);
        let key = FormatCache::key(&language, &settings, code);

        let cached = self.lock_cache().get(&key);
        if let Some(cached) = cached {
            log::debug!("Format cache hit for {language} ({key})");
            return FormatResult::success(cached);
        }

        let result = self.registry.format(code, &language, &settings).await;
        if result.is_success() {
            self.lock_cache().insert(key, result.code.clone());
        }
        result
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.registry.is_supported(language)
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.registry.supported_languages()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, FormatCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

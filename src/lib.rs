pub mod cache;
pub mod config;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod exit_codes;
pub mod formatter;
pub mod language;
pub mod rate_limit;
pub mod sequence;
pub mod settings;
pub mod types;

pub use crate::cache::{CacheKey, CacheStats, FormatCache};
pub use crate::config::{Config, ConfigError};
pub use crate::detect::{Detection, DetectionSource, LanguageDetector, PageInfo, PageVerdict, classify_page};
pub use crate::dispatch::{FormatService, ServiceConfig};
pub use crate::error::{FormatError, FormatErrorKind};
pub use crate::formatter::{FormatResult, Formatter, FormatterMetadata, FormatterRegistry};
pub use crate::language::{LanguageResolver, normalize_language};
pub use crate::rate_limit::{RateLimitConfig, RateLimiter};
pub use crate::sequence::RequestSequence;
pub use crate::settings::{FormatterSettings, RawSettings};

use crate::formatter::{BuiltinPluginLoader, NoBinaryModules};
use std::sync::Arc;

/// Format service with the built-in backends and settings from `config`.
///
/// Binary-module backends report themselves unavailable, since no
/// module host is attached outside an embedding application.
pub fn service_from_config(config: &Config) -> FormatService {
    let registry = FormatterRegistry::with_builtin_backends(
        Arc::new(NoBinaryModules),
        Arc::new(BuiltinPluginLoader),
        &config.service.wasm_base,
    );
    FormatService::new(Arc::new(registry), config.to_service_config())
}

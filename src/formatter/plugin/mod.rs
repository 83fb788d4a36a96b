//! Lazy-plugin backend.
//!
//! Formatting for a language needs one or more plugins. The first request
//! for a language loads them through a [`PluginLoader`]; loaded plugins are
//! kept for the life of the backend, keyed by plugin id, and concurrent
//! first requests share a single in-flight load.

mod builtin;
mod sql;

pub use builtin::BuiltinPluginLoader;

use super::{AsyncMemo, Formatter, FormatterMetadata};
use crate::error::FormatError;
use crate::settings::FormatterSettings;
use async_trait::async_trait;
use std::sync::Arc;

/// A loaded formatting plugin.
pub trait FormatPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, language: &str) -> bool;

    fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError>;
}

/// Source of plugins, parameterized only by plugin id.
#[async_trait]
pub trait PluginLoader: Send + Sync {
    async fn load(&self, id: &str) -> Result<Arc<dyn FormatPlugin>, FormatError>;
}

/// Language -> ordered plugin ids to load before formatting.
static PLUGIN_TABLE: &[(&str, &[&str])] = &[("json", &["json"]), ("yaml", &["yaml"]), ("sql", &["sql"])];

/// Plugin ids needed for `language`, if any plugin handles it.
pub fn plugins_for(language: &str) -> Option<&'static [&'static str]> {
    PLUGIN_TABLE
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, ids)| *ids)
}

pub struct PluginFormatter {
    metadata: FormatterMetadata,
    loader: Arc<dyn PluginLoader>,
    plugins: AsyncMemo<String, Arc<dyn FormatPlugin>>,
}

impl PluginFormatter {
    pub fn new(loader: Arc<dyn PluginLoader>) -> Self {
        let languages: Vec<&str> = PLUGIN_TABLE.iter().map(|(lang, _)| *lang).collect();
        Self {
            metadata: FormatterMetadata::new("plugins", "Plugin Formatter", &languages)
                .formatter(true)
                .opinionated(true)
                .tolerant(false),
            loader,
            plugins: AsyncMemo::new(),
        }
    }

    /// Number of plugins loaded so far.
    pub fn loaded_plugins(&self) -> usize {
        self.plugins.loaded_count()
    }

    async fn load_plugins(&self, ids: &[&str]) -> Result<Vec<Arc<dyn FormatPlugin>>, FormatError> {
        let mut loaded = Vec::with_capacity(ids.len());
        for &id in ids {
            let plugin = self
                .plugins
                .get_or_try_init(&id.to_string(), || async move {
                    log::debug!("Loading formatter plugin '{id}'");
                    self.loader.load(id).await
                })
                .await
                .inspect_err(|e| log::warn!("Failed to load plugin '{id}': {e}"))?;
            loaded.push(plugin);
        }
        Ok(loaded)
    }
}

#[async_trait]
impl Formatter for PluginFormatter {
    fn metadata(&self) -> &FormatterMetadata {
        &self.metadata
    }

    async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let Some(ids) = plugins_for(language) else {
            return Err(FormatError::unsupported(language));
        };

        let plugins = self.load_plugins(ids).await?;
        let plugin = plugins
            .iter()
            .find(|p| p.supports(language))
            .ok_or_else(|| FormatError::load_failure(format!("No loaded plugin handles '{language}'")))?;

        plugin.format(code, language, settings)
    }
}

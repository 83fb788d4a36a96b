//! Configuration file loading.
//!
//! A `.codeview.toml` has two tables:
//!
//! ```toml
//! [settings]          # default format settings, same keys as a request
//! indentSize = 4
//! singleQuote = true
//!
//! [service]
//! max-input-bytes = 1048576
//! cache-capacity = 50
//! rate-limit = 10
//! rate-window-ms = 1000
//! wasm-base = "wasm"
//! ```
//!
//! Without an explicit path the file is searched upward from the working
//! directory, stopping at the first `.git` directory.

use crate::cache::DEFAULT_CAPACITY;
use crate::dispatch::{DEFAULT_MAX_INPUT_BYTES, ServiceConfig};
use crate::rate_limit::RateLimitConfig;
use crate::settings::RawSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".codeview.toml";

/// Upward search stops after this many parent directories.
const MAX_DISCOVERY_DEPTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServiceSection {
    pub max_input_bytes: usize,
    pub cache_capacity: usize,
    /// Requests per window and caller; 0 disables limiting
    pub rate_limit: u32,
    pub rate_window_ms: u64,
    /// Base path the wasm loaders and binaries are served from
    pub wasm_base: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        let rate = RateLimitConfig::default();
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            cache_capacity: DEFAULT_CAPACITY,
            rate_limit: rate.max_requests,
            rate_window_ms: u64::try_from(rate.window.as_millis()).unwrap_or(u64::MAX),
            wasm_base: "wasm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: RawSettings,
    pub service: ServiceSection,
}

impl Config {
    /// Load from an explicit path, or discover one. No file at all yields
    /// the defaults; an explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::current_dir().ok().and_then(|dir| discover_from(&dir)) {
                Some(found) => Self::from_file(&found),
                None => {
                    log::debug!("No {CONFIG_FILE_NAME} found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        log::debug!("Loading config from {display}");
        Self::parse(&content, &display)
    }

    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.rate_limit > 0 && self.service.rate_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "service.rate-window-ms".to_string(),
                message: "must be positive when rate-limit is set".to_string(),
            });
        }
        if self.service.wasm_base.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "service.wasm-base".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_input_bytes: self.service.max_input_bytes,
            cache_capacity: self.service.cache_capacity,
            rate_limit: RateLimitConfig {
                max_requests: self.service.rate_limit,
                window: Duration::from_millis(self.service.rate_window_ms),
            },
        }
    }
}

/// Find the nearest config file at or above `start`.
pub fn discover_from(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(dir) = current {
        if depth >= MAX_DISCOVERY_DEPTH {
            log::debug!("Config discovery depth limit reached");
            break;
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            log::debug!("Found config file: {}", candidate.display());
            return Some(candidate);
        }
        if dir.join(".git").exists() {
            break;
        }
        current = dir.parent();
        depth += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndentToken;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_service_defaults() {
        assert_eq!(Config::default().to_service_config(), ServiceConfig::default());
    }

    #[test]
    fn test_parse_both_sections() {
        let config = Config::parse(
            r#"
[settings]
indentSize = "tab"
singleQuote = true

[service]
cache-capacity = 5
rate-limit = 0
"#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.settings.indent_size, Some(IndentToken::Tab));
        assert_eq!(config.settings.single_quote, Some(true));
        let service = config.to_service_config();
        assert_eq!(service.cache_capacity, 5);
        assert_eq!(service.rate_limit.max_requests, 0);
        assert_eq!(service.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    }

    #[test]
    fn test_unknown_service_key_is_rejected() {
        let err = Config::parse("[service]\ncache-size = 3\n", "x.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("x.toml"));
    }

    #[test]
    fn test_zero_window_with_limit_is_invalid() {
        let err = Config::parse("[service]\nrate-window-ms = 0\n", "x.toml").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_discovery_walks_up_and_stops_at_git() {
        let root = tempdir().unwrap();
        let project = root.path().join("project");
        let nested = project.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(project.join(".git")).unwrap();

        assert_eq!(discover_from(&nested), None);

        fs::write(root.path().join(CONFIG_FILE_NAME), "").unwrap();
        // Above the .git boundary, so still not found.
        assert_eq!(discover_from(&nested), None);

        fs::write(project.join(CONFIG_FILE_NAME), "[service]\nrate-limit = 3\n").unwrap();
        let found = discover_from(&nested).unwrap();
        assert_eq!(found, project.join(CONFIG_FILE_NAME));
        assert_eq!(Config::from_file(&found).unwrap().service.rate_limit, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

//! Plugins shipped with the crate.

use super::sql::SqlPlugin;
use super::{FormatPlugin, PluginLoader};
use crate::error::FormatError;
use crate::settings::FormatterSettings;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Loads the in-process `json`, `yaml` and `sql` plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPluginLoader;

#[async_trait]
impl PluginLoader for BuiltinPluginLoader {
    async fn load(&self, id: &str) -> Result<Arc<dyn FormatPlugin>, FormatError> {
        match id {
            "json" => Ok(Arc::new(JsonPlugin)),
            "yaml" => Ok(Arc::new(YamlPlugin)),
            "sql" => Ok(Arc::new(SqlPlugin)),
            other => Err(FormatError::load_failure(format!("Unknown formatter plugin '{other}'"))),
        }
    }
}

/// Strict JSON pretty-printer. Key order is preserved.
struct JsonPlugin;

impl FormatPlugin for JsonPlugin {
    fn name(&self) -> &str {
        "json"
    }

    fn supports(&self, language: &str) -> bool {
        language == "json"
    }

    fn format(&self, code: &str, _language: &str, settings: &FormatterSettings) -> Result<String, FormatError> {
        let value: serde_json::Value =
            serde_json::from_str(code).map_err(|e| FormatError::format_failure(format!("Invalid JSON: {e}")))?;

        let indent = settings.indent_unit();
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| FormatError::format_failure(format!("Failed to write JSON: {e}")))?;

        let mut out =
            String::from_utf8(buf).map_err(|e| FormatError::format_failure(format!("Failed to write JSON: {e}")))?;
        out.push('\n');
        Ok(out)
    }
}

/// YAML normalizer. Re-serialization drops comments, so commented input
/// is refused rather than silently stripped.
struct YamlPlugin;

impl FormatPlugin for YamlPlugin {
    fn name(&self) -> &str {
        "yaml"
    }

    fn supports(&self, language: &str) -> bool {
        language == "yaml"
    }

    fn format(&self, code: &str, _language: &str, _settings: &FormatterSettings) -> Result<String, FormatError> {
        if code.trim().is_empty() {
            return Ok(String::new());
        }
        if has_yaml_comment(code) {
            return Err(FormatError::format_failure(
                "YAML with comments cannot be reformatted without losing them",
            ));
        }

        let value: serde_yml::Value =
            serde_yml::from_str(code).map_err(|e| FormatError::format_failure(format!("Invalid YAML: {e}")))?;
        serde_yml::to_string(&value).map_err(|e| FormatError::format_failure(format!("Failed to write YAML: {e}")))
    }
}

/// A `#` that starts a line or follows whitespace outside quotes.
fn has_yaml_comment(code: &str) -> bool {
    code.lines().any(|line| {
        let mut quote: Option<char> = None;
        let mut prev_is_space = true;
        for c in line.chars() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == '#' && prev_is_space => return true,
                None => {}
            }
            prev_is_space = c.is_whitespace();
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;
    use pretty_assertions::assert_eq;

    async fn plugin(id: &str) -> Arc<dyn FormatPlugin> {
        BuiltinPluginLoader.load(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_json_pretty_print_keeps_key_order() {
        let json = plugin("json").await;
        let out = json
            .format(r#"{"z":1,"a":[true,null]}"#, "json", &FormatterSettings::for_language("json"))
            .unwrap();
        assert_eq!(out, "{\n  \"z\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}\n");
    }

    #[tokio::test]
    async fn test_json_rejects_malformed_input() {
        let json = plugin("json").await;
        let err = json
            .format(r#"{"a":1,"b":[1,2,}"#, "json", &FormatterSettings::default())
            .unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::BackendFormatFailure);
        assert!(err.message.starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_yaml_normalizes_layout() {
        let yaml = plugin("yaml").await;
        let out = yaml
            .format("a:   1\nb:\n    - x\n    - y\n", "yaml", &FormatterSettings::default())
            .unwrap();
        assert!(out.starts_with("a: 1\nb:\n"));
        assert!(out.contains("- x\n"));
    }

    #[tokio::test]
    async fn test_yaml_with_comments_refused() {
        let yaml = plugin("yaml").await;
        let err = yaml
            .format("a: 1 # keep me\n", "yaml", &FormatterSettings::default())
            .unwrap_err();
        assert!(err.message.contains("comments"));
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        assert!(!has_yaml_comment("color: \"#fff\"\nurl: a#b\n"));
        assert!(has_yaml_comment("# header\nkey: v\n"));
    }

    #[tokio::test]
    async fn test_unknown_plugin_is_load_failure() {
        let err = BuiltinPluginLoader.load("graphql").await.err().unwrap();
        assert_eq!(err.kind, FormatErrorKind::BackendLoadFailure);
    }
}

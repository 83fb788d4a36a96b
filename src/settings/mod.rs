//! Settings normalization.
//!
//! A format request carries a flat, loosely typed settings bag
//! ([`RawSettings`]) as persisted by the settings UI. [`resolve`] merges it
//! with the per-language defaults and the global defaults into the concrete
//! [`FormatterSettings`] every backend consumes:
//!
//! ```text
//! user override  ??  language default  ??  global default
//! ```
//!
//! The first layer that defines a field wins. Resolution is a pure function
//! of its inputs.

mod defaults;

pub use defaults::{GLOBAL_DEFAULTS, language_defaults};

use crate::error::FormatError;
use crate::language::normalize_language;
use crate::types::{IndentSize, IndentToken, LineWidth};
use serde::{Deserialize, Serialize};

/// Quote preference for string literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    Double,
    Single,
}

/// Trailing comma policy for multi-line literals and argument lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingComma {
    None,
    #[default]
    Es5,
    All,
}

/// Keyword casing for query languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCase {
    #[default]
    Preserve,
    Upper,
    Lower,
}

/// Where list separators go when a list is broken across lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommaPosition {
    Before,
    #[default]
    After,
}

/// User-supplied settings as persisted by the settings UI.
///
/// Every field is optional; absent fields fall through to the language
/// defaults and then to the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_size: Option<IndentToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_tabs: Option<bool>,
    #[serde(alias = "quoteStyle", skip_serializing_if = "Option::is_none")]
    pub single_quote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_comma: Option<TrailingComma>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_wrap: Option<LineWidth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_case: Option<KeywordCase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comma_position: Option<CommaPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_entries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_tables: Option<bool>,
}

impl RawSettings {
    /// Parse an untyped settings bag.
    ///
    /// Unknown keys are ignored; recognized keys with the wrong shape are
    /// reported as [`FormatErrorKind::InvalidInput`](crate::error::FormatErrorKind::InvalidInput).
    pub fn from_value(value: &serde_json::Value) -> Result<Self, FormatError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(FormatError::invalid_input("Settings must be a key-value object"));
        }
        Self::deserialize(value).map_err(|e| FormatError::invalid_input(format!("Invalid settings: {e}")))
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &RawSettings) -> RawSettings {
        RawSettings {
            indent_size: other.indent_size.or(self.indent_size),
            use_tabs: other.use_tabs.or(self.use_tabs),
            single_quote: other.single_quote.or(self.single_quote),
            semi: other.semi.or(self.semi),
            trailing_comma: other.trailing_comma.or(self.trailing_comma),
            line_wrap: other.line_wrap.or(self.line_wrap),
            keyword_case: other.keyword_case.or(self.keyword_case),
            comma_position: other.comma_position.or(self.comma_position),
            align_entries: other.align_entries.or(self.align_entries),
            align_comments: other.align_comments.or(self.align_comments),
            indent_tables: other.indent_tables.or(self.indent_tables),
        }
    }
}

/// Fully resolved settings for one format request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterSettings {
    pub indent_width: IndentSize,
    pub use_tabs: bool,
    pub quote_style: QuoteStyle,
    pub semi: bool,
    pub trailing_comma: TrailingComma,
    pub line_wrap: LineWidth,
    pub keyword_case: KeywordCase,
    pub comma_position: CommaPosition,
    pub align_entries: bool,
    pub align_comments: bool,
    pub indent_tables: bool,
}

impl FormatterSettings {
    /// Defaults for a language with no user overrides.
    pub fn for_language(language: &str) -> Self {
        resolve(&RawSettings::default(), language)
    }

    /// One level of indentation as text.
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_width.as_usize())
        }
    }

    /// Visual width of one indentation level.
    pub fn indent_columns(&self) -> usize {
        self.indent_width.as_usize()
    }
}

impl Default for FormatterSettings {
    fn default() -> Self {
        resolve_layers(&RawSettings::default(), &RawSettings::default())
    }
}

/// Merge user settings with the defaults for `language`.
///
/// The language is normalized first, so aliases pick up the same defaults
/// as their canonical name.
pub fn resolve(user: &RawSettings, language: &str) -> FormatterSettings {
    let language = normalize_language(language);
    resolve_layers(user, &language_defaults(&language))
}

fn resolve_layers(user: &RawSettings, lang: &RawSettings) -> FormatterSettings {
    let global = &*GLOBAL_DEFAULTS;
    let layers = [user, lang, global];

    // The first layer that sets indentSize decides between tabs and spaces;
    // a "tab" token carries no width, so the width comes from the next
    // numeric layer down.
    let indent_token = layers.iter().find_map(|layer| layer.indent_size);
    let indent_width = layers
        .iter()
        .find_map(|layer| layer.indent_size.and_then(IndentToken::width))
        .unwrap_or_default();
    let use_tabs = match indent_token {
        Some(IndentToken::Tab) => true,
        _ => first(&layers, |layer| layer.use_tabs).unwrap_or(false),
    };

    let quote_style = match first(&layers, |layer| layer.single_quote) {
        Some(true) => QuoteStyle::Single,
        _ => QuoteStyle::Double,
    };

    FormatterSettings {
        indent_width,
        use_tabs,
        quote_style,
        semi: first(&layers, |layer| layer.semi).unwrap_or(true),
        trailing_comma: first(&layers, |layer| layer.trailing_comma).unwrap_or_default(),
        line_wrap: first(&layers, |layer| layer.line_wrap).unwrap_or_default(),
        keyword_case: first(&layers, |layer| layer.keyword_case).unwrap_or_default(),
        comma_position: first(&layers, |layer| layer.comma_position).unwrap_or_default(),
        align_entries: first(&layers, |layer| layer.align_entries).unwrap_or(false),
        align_comments: first(&layers, |layer| layer.align_comments).unwrap_or(true),
        indent_tables: first(&layers, |layer| layer.indent_tables).unwrap_or(false),
    }
}

fn first<T>(layers: &[&RawSettings], field: impl Fn(&RawSettings) -> Option<T>) -> Option<T> {
    layers.iter().find_map(|layer| field(*layer))
}

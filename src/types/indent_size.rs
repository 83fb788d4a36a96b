use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Indentation width (1-8 columns)
///
/// Values outside 1-8 are either mistakes or impractical for any of the
/// supported languages. Common values are 2 (default) and 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndentSize(u8);

impl IndentSize {
    /// Minimum indentation (1 column)
    pub const MIN: u8 = 1;
    /// Maximum indentation (8 columns)
    pub const MAX: u8 = 8;

    /// Create a new IndentSize, validating it's in range 1-8.
    ///
    /// # Errors
    /// Returns `IndentSizeError` if the value is not between 1 and 8 inclusive.
    pub fn new(value: u8) -> Result<Self, IndentSizeError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(IndentSizeError(value.into()))
        }
    }

    /// Get the underlying value (guaranteed to be 1-8).
    pub fn get(self) -> u8 {
        self.0
    }

    /// Convert to usize for use in calculations.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Convert from a default value (for use in default tables).
    ///
    /// # Panics
    /// Panics if the value is not in range 1-8. This is intended for const defaults only.
    pub const fn from_const(value: u8) -> Self {
        assert!(
            value >= Self::MIN && value <= Self::MAX,
            "IndentSize must be between 1 and 8"
        );
        Self(value)
    }
}

impl Default for IndentSize {
    fn default() -> Self {
        Self(2)
    }
}

/// Error type for invalid IndentSize values.
#[derive(Debug, Clone, Copy)]
pub struct IndentSizeError(u64);

impl fmt::Display for IndentSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indentation must be between {} and {} columns or \"tab\", got {}",
            IndentSize::MIN,
            IndentSize::MAX,
            self.0
        )
    }
}

impl std::error::Error for IndentSizeError {}

impl<'de> Deserialize<'de> for IndentSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        IndentSize::new(value).map_err(de::Error::custom)
    }
}

impl Serialize for IndentSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl From<IndentSize> for usize {
    fn from(val: IndentSize) -> Self {
        val.0 as usize
    }
}

/// The `indentSize` setting as stored by the settings UI.
///
/// Accepts a width (`4`), a numeric string (`"4"`), or the token `"tab"`
/// (also `"tabs"`) meaning "indent with tabs".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentToken {
    Width(IndentSize),
    Tab,
}

impl IndentToken {
    pub fn width(self) -> Option<IndentSize> {
        match self {
            Self::Width(size) => Some(size),
            Self::Tab => None,
        }
    }

    pub fn is_tab(self) -> bool {
        matches!(self, Self::Tab)
    }

    fn from_number(value: u64) -> Result<Self, IndentSizeError> {
        let narrowed = u8::try_from(value).map_err(|_| IndentSizeError(value))?;
        IndentSize::new(narrowed).map(Self::Width)
    }
}

impl From<IndentSize> for IndentToken {
    fn from(size: IndentSize) -> Self {
        Self::Width(size)
    }
}

impl<'de> Deserialize<'de> for IndentToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TokenVisitor;

        impl Visitor<'_> for TokenVisitor {
            type Value = IndentToken;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an indentation width between 1 and 8 or \"tab\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<IndentToken, E> {
                IndentToken::from_number(value).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<IndentToken, E> {
                let value = u64::try_from(value).map_err(|_| E::custom(format!("negative indentation {value}")))?;
                self.visit_u64(value)
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<IndentToken, E> {
                if value.fract() == 0.0 && value >= 0.0 && value <= u8::MAX as f64 {
                    self.visit_u64(value as u64)
                } else {
                    Err(E::custom(format!("invalid indentation {value}")))
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<IndentToken, E> {
                let trimmed = value.trim();
                if trimmed.eq_ignore_ascii_case("tab") || trimmed.eq_ignore_ascii_case("tabs") {
                    return Ok(IndentToken::Tab);
                }
                let number: u64 = trimmed
                    .parse()
                    .map_err(|_| E::custom(format!("invalid indentation \"{value}\"")))?;
                self.visit_u64(number)
            }
        }

        deserializer.deserialize_any(TokenVisitor)
    }
}

impl Serialize for IndentToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Width(size) => size.serialize(serializer),
            Self::Tab => serializer.serialize_str("tab"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_values() {
        for value in 1..=8 {
            let indent = IndentSize::new(value).unwrap();
            assert_eq!(indent.get(), value);
            assert_eq!(indent.as_usize(), value as usize);
        }
    }

    #[test]
    fn test_invalid_values() {
        for value in [0, 9, 10, 50, 255] {
            assert!(IndentSize::new(value).is_err());
        }
    }

    #[test]
    fn test_token_from_json() {
        let width: IndentToken = serde_json::from_str("4").unwrap();
        assert_eq!(width, IndentToken::Width(IndentSize::from_const(4)));

        let numeric_string: IndentToken = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(numeric_string.width().map(IndentSize::get), Some(2));

        let tab: IndentToken = serde_json::from_str("\"tab\"").unwrap();
        assert!(tab.is_tab());

        let tabs: IndentToken = serde_json::from_str("\"Tabs\"").unwrap();
        assert!(tabs.is_tab());
    }

    #[test]
    fn test_token_rejects_out_of_range() {
        assert!(serde_json::from_str::<IndentToken>("0").is_err());
        assert!(serde_json::from_str::<IndentToken>("300").is_err());
        assert!(serde_json::from_str::<IndentToken>("-2").is_err());
        assert!(serde_json::from_str::<IndentToken>("\"wide\"").is_err());
    }

    #[test]
    fn test_token_from_toml() {
        #[derive(Debug, serde::Deserialize)]
        struct TestConfig {
            indent: IndentToken,
        }

        let config: TestConfig = toml::from_str("indent = \"tab\"").unwrap();
        assert!(config.indent.is_tab());

        let config: TestConfig = toml::from_str("indent = 3").unwrap();
        assert_eq!(config.indent.width().map(IndentSize::get), Some(3));

        let err = toml::from_str::<TestConfig>("indent = 12").unwrap_err().to_string();
        assert!(err.contains("between 1 and 8"));
    }

    #[test]
    fn test_token_serializes_as_written() {
        assert_eq!(serde_json::to_string(&IndentToken::Tab).unwrap(), "\"tab\"");
        assert_eq!(
            serde_json::to_string(&IndentToken::Width(IndentSize::from_const(4))).unwrap(),
            "4"
        );
    }
}

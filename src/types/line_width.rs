use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Preferred maximum line width for formatted output.
///
/// 0 means "do not wrap"; any other value is the column limit a backend
/// should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineWidth(Option<usize>);

impl LineWidth {
    /// Create a new LineWidth, where 0 means no wrapping.
    pub fn new(value: usize) -> Self {
        if value == 0 { Self(None) } else { Self(Some(value)) }
    }

    /// Get the underlying value (0 for no wrapping).
    pub fn get(self) -> usize {
        self.0.unwrap_or(0)
    }

    pub fn is_unlimited(self) -> bool {
        self.0.is_none()
    }

    /// Returns usize::MAX when unlimited, otherwise the column limit.
    pub fn effective_limit(self) -> usize {
        self.0.unwrap_or(usize::MAX)
    }

    pub const fn from_const(value: usize) -> Self {
        if value == 0 { Self(None) } else { Self(Some(value)) }
    }
}

impl<'de> Deserialize<'de> for LineWidth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Ok(LineWidth::new(value))
    }
}

impl Serialize for LineWidth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl From<LineWidth> for usize {
    fn from(val: LineWidth) -> Self {
        val.get()
    }
}

impl fmt::Display for LineWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "unlimited")
        } else {
            write!(f, "{}", self.get())
        }
    }
}

impl Default for LineWidth {
    fn default() -> Self {
        Self::from_const(80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_unlimited() {
        let unlimited = LineWidth::new(0);
        assert!(unlimited.is_unlimited());
        assert_eq!(unlimited.effective_limit(), usize::MAX);
        assert_eq!(format!("{unlimited}"), "unlimited");
    }

    #[test]
    fn test_limited_values() {
        for value in [1, 40, 80, 120] {
            let width = LineWidth::new(value);
            assert_eq!(width.get(), value);
            assert_eq!(width.effective_limit(), value);
            assert_eq!(usize::from(width), value);
        }
    }

    #[test]
    fn test_deserialization() {
        #[derive(Debug, serde::Deserialize)]
        struct TestConfig {
            value: LineWidth,
        }

        let config: TestConfig = toml::from_str("value = 0").unwrap();
        assert!(config.value.is_unlimited());

        let config: TestConfig = serde_json::from_str(r#"{"value": 100}"#).unwrap();
        assert_eq!(config.value.get(), 100);

        assert!(serde_json::from_str::<TestConfig>(r#"{"value": -1}"#).is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{TranslateError, TranslateResult};

/// Configuration for translator creation and execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Index flag for fields that carry neither `Index` nor `Unindex`.
    pub index_by_default: bool,
    /// Accept integer nodes for float fields and vice versa.
    pub coerce_numbers: bool,
    /// Maximum nesting while resolving translators for one type.
    pub max_depth: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            index_by_default: false,
            coerce_numbers: true,
            max_depth: 32,
        }
    }
}

impl MappingConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> TranslateResult<Self> {
        toml::from_str(s).map_err(|e| TranslateError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = MappingConfig::default();
        assert!(!c.index_by_default);
        assert!(c.coerce_numbers);
        assert_eq!(c.max_depth, 32);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = MappingConfig::from_toml_str("index_by_default = true").unwrap();
        assert!(c.index_by_default);
        assert!(c.coerce_numbers);
        assert_eq!(c.max_depth, 32);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = MappingConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, TranslateError::Config(_)));
    }
}

//! Engine configuration.

use ormql_proto::StringComparison;

/// Configuration for a [`QueryEngine`](crate::QueryEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// String comparison mode used when a leaf does not specify `case`.
    pub default_string_comparison: StringComparison,

    /// Build narrowed projections. When disabled every projection request
    /// falls back to loading full entities.
    pub projection: bool,

    /// Reject schemas with dangling references when the engine is created.
    pub validate_schema: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_string_comparison: StringComparison::OrdinalIgnoreCase,
            projection: true,
            validate_schema: true,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default string comparison mode.
    pub fn with_default_string_comparison(mut self, mode: StringComparison) -> Self {
        self.default_string_comparison = mode;
        self
    }

    /// Disable narrowed projections.
    pub fn without_projection(mut self) -> Self {
        self.projection = false;
        self
    }

    /// Skip schema validation.
    pub fn without_schema_validation(mut self) -> Self {
        self.validate_schema = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(
            config.default_string_comparison,
            StringComparison::OrdinalIgnoreCase
        );
        assert!(config.projection);
        assert!(config.validate_schema);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_default_string_comparison(StringComparison::Ordinal)
            .without_projection()
            .without_schema_validation();

        assert_eq!(config.default_string_comparison, StringComparison::Ordinal);
        assert!(!config.projection);
        assert!(!config.validate_schema);
    }
}

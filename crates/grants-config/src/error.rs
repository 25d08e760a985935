//! Configuration errors

/// Errors while reading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed
    #[error("invalid value for {key}: '{value}' (expected {expected})")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
        /// Expected type description
        expected: &'static str,
    },

    /// Settings parsed but are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create invalid value error
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

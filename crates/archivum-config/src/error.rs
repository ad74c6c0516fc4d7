//! Configuration error types

use thiserror::Error;

/// Configuration validation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric limit was set to zero
    #[error("Limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),

    /// An ancestry field name was left empty
    #[error("Ancestry field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Two ancestry roles share the same document field
    #[error("Ancestry fields '{first}' and '{second}' both map to '{field}'")]
    DuplicateField {
        /// First role name
        first: &'static str,
        /// Second role name
        second: &'static str,
        /// Shared document field
        field: String,
    },

    /// An environment override could not be parsed
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv {
        /// Environment variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

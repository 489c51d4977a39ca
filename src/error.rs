//! Error kinds reported by configuration resolution.

use thiserror::Error;

/// Configuration resolution error
///
/// Every stage of [`crate::resolve`] reports failures with this type, and the
/// facade surfaces them unwrapped so callers can match on the original kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A field has the wrong type or an unrecognized value
    #[error("invalid field '{path}': expected {expected}")]
    InvalidField {
        /// Dotted path to the field (e.g., "content[1].pattern")
        path: String,
        /// Description of the expected type or values
        expected: String,
    },
    /// A content pattern is syntactically invalid
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as declared
        pattern: String,
        /// What is wrong with it
        reason: String,
    },
    /// A content pattern resolves outside the project root
    #[error("pattern '{pattern}' escapes the project root")]
    UnsafePattern {
        /// The pattern as declared
        pattern: String,
    },
    /// The same plugin identity was declared more than once
    #[error("plugin '{0}' is declared more than once")]
    DuplicatePlugin(String),
    /// A plugin could not be loaded or its contribution failed
    #[error("plugin '{name}' failed: {cause}")]
    PluginFailure {
        /// Plugin identity
        name: String,
        /// Failure description
        cause: String,
    },
    /// No content source was declared in eager discovery mode
    #[error("no content sources configured; at least one pattern is required in \"all\" mode")]
    EmptyContent,
    /// Resolution was superseded before it finished
    #[error("resolution cancelled")]
    Cancelled,
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidField`] error
    pub fn invalid_field(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidField { path: path.into(), expected: expected.into() }
    }

    /// Build an [`ConfigError::InvalidPattern`] error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern { pattern: pattern.into(), reason: reason.into() }
    }

    /// Build an [`ConfigError::UnsafePattern`] error
    pub fn unsafe_pattern(pattern: impl Into<String>) -> Self {
        Self::UnsafePattern { pattern: pattern.into() }
    }

    /// Build an [`ConfigError::PluginFailure`] error
    pub fn plugin_failure(name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::PluginFailure { name: name.into(), cause: cause.into() }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::InvalidField { .. } => "invalid_field",
            ConfigError::InvalidPattern { .. } => "invalid_pattern",
            ConfigError::UnsafePattern { .. } => "unsafe_pattern",
            ConfigError::DuplicatePlugin(_) => "duplicate_plugin",
            ConfigError::PluginFailure { .. } => "plugin_failure",
            ConfigError::EmptyContent => "empty_content",
            ConfigError::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_display() {
        let err = ConfigError::invalid_field("content[0]", "string");
        assert_eq!(err.to_string(), "invalid field 'content[0]': expected string");
    }

    #[test]
    fn test_plugin_failure_display() {
        let err = ConfigError::plugin_failure("forms", "boom");
        assert_eq!(err.to_string(), "plugin 'forms' failed: boom");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ConfigError::EmptyContent.kind(), "empty_content");
        assert_eq!(ConfigError::DuplicatePlugin("a".into()).kind(), "duplicate_plugin");
        assert_eq!(ConfigError::unsafe_pattern("../x").kind(), "unsafe_pattern");
    }
}

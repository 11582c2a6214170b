//! Error types for database URL parsing.

use thiserror::Error;

/// Errors that can occur while turning a database URL into settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The URL scheme has no registered backend.
    #[error("Scheme '{0}://' is unknown. Did you forget to register custom backend?")]
    UnknownScheme(String),

    /// The URL could not be decomposed into its components.
    #[error(
        "This string is not a valid url, possibly because some of its parts \
         are not properly percent-encoded: {0}"
    )]
    MalformedUrl(String),

    /// An explicit override for a well-known setting had the wrong shape.
    #[error("Invalid override '{key}': {message}")]
    InvalidOverride { key: String, message: String },
}

impl ConnectionError {
    /// Create an unknown scheme error.
    pub fn unknown_scheme(scheme: impl Into<String>) -> Self {
        Self::UnknownScheme(scheme.into())
    }

    /// Create a malformed URL error.
    pub fn malformed_url(detail: impl Into<String>) -> Self {
        Self::MalformedUrl(detail.into())
    }

    /// Create an invalid override error.
    pub fn invalid_override(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this is an unknown scheme error.
    pub fn is_unknown_scheme(&self) -> bool {
        matches!(self, Self::UnknownScheme(_))
    }

    /// Check if this is a malformed URL error.
    pub fn is_malformed_url(&self) -> bool {
        matches!(self, Self::MalformedUrl(_))
    }
}

/// Result type for URL parsing operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

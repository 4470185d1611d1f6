//! Error types for zonectl
//!
//! Errors fall into categories that callers branch on:
//!
//! - **Integrity** violations are programming defects (a name/FQDN pair that
//!   no longer round-trips, a record merged twice, a compound record asked for
//!   a single target). The binary turns them into process termination.
//! - **Validation** errors describe bad desired configuration and are
//!   collected and reported together before any provider is contacted.
//! - **Codec** errors come from parsing compound record values and are
//!   recoverable.
//! - Everything else (provider, config, I/O) is a runtime failure contained
//!   at the domain level by the orchestrator.

use thiserror::Error;

/// Result type alias for zonectl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Programming defect, never user-recoverable
    Integrity,
    /// Invalid desired configuration
    Validation,
    /// Malformed compound value or numeric overflow of a subfield
    Codec,
    /// Provider or registrar read/write failure
    Provider,
    /// Configuration or credentials loading failure
    Config,
    /// Any other runtime failure
    Runtime,
}

/// Core error type for zonectl
#[derive(Error, Debug)]
pub enum Error {
    /// Broken internal invariant
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Invalid desired configuration
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed compound record value
    #[error("format error: {0}")]
    Codec(String),

    /// Provider-specific error
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an integrity violation
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a codec (format) error
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// The category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Integrity(_) => ErrorCategory::Integrity,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Codec(_) => ErrorCategory::Codec,
            Error::Provider { .. } => ErrorCategory::Provider,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => ErrorCategory::Runtime,
        }
    }

    /// Whether this error signals a programming defect
    pub fn is_integrity(&self) -> bool {
        self.category() == ErrorCategory::Integrity
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

//! Error types for the Zealot core library
//!
//! Errors fall into two groups. `Validation` and `Generation` mean the call
//! cannot proceed and always abort the current operation. `Transport` and
//! `Service` describe a remote failure; they normally travel as an
//! [`Outcome`](crate::types::Outcome) value and only become errors once the
//! reporter escalates them into `Fatal`.

use crate::types::TransportErrorKind;
use thiserror::Error;

/// Main error type for Zealot client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete caller input, detected before any network call
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// No debug-file payload could be resolved or generated
    #[error("Debug file generation failed: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Network-level failure that reached the caller as an error
    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// The service answered with an explicit or implicit error condition
    #[error("Service error [{}]: {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string()))]
    Service { status: Option<u16>, message: String },

    /// Invalid client or transport configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A failure escalated by the reporter because `fail_on_error` is set
    #[error("{message}")]
    Fatal { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a generation error without an underlying cause
    pub fn generation(message: impl Into<String>) -> Self {
        Error::Generation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error aborts the operation regardless of `fail_on_error`
    pub fn is_always_fatal(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::Generation { .. }
                | Error::Configuration { .. }
                | Error::Io { .. }
                | Error::Fatal { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

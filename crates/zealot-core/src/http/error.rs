//! Transport failure classification
//!
//! Maps `reqwest` errors onto the two failure kinds callers distinguish and
//! decides which of them are safe to retry.

use crate::types::TransportErrorKind;
use reqwest::Method;
use std::fmt;

/// A request that produced no response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub message: String,
    /// The request may have reached the service before the failure
    pub delivered: bool,
}

impl TransportFailure {
    /// The connection could not be established; nothing was sent
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connection,
            message: message.into(),
            delivered: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            message: message.into(),
            delivered: true,
        }
    }

    /// The connection broke after the request was handed to the service
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connection,
            message: message.into(),
            delivered: true,
        }
    }

    /// Create from a network/request error
    pub fn from_request_error(error: reqwest::Error) -> Self {
        // A connect timeout reports both flags; the host never answered in time.
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::Connection
        };

        Self {
            kind,
            message: error.to_string(),
            delivered: !error.is_connect(),
        }
    }

    /// Whether resending is safe for this failure and method
    ///
    /// A request that never left the client may be resent whatever its
    /// method. Once it may have been processed only idempotent methods are
    /// resent, so an upload is never duplicated.
    pub fn is_retryable(&self, method: &Method) -> bool {
        !self.delivered || is_idempotent(method)
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportFailure {}

impl From<TransportFailure> for crate::Error {
    fn from(failure: TransportFailure) -> Self {
        crate::Error::Transport {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

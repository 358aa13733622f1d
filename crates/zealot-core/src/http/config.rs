//! Transport configuration
//!
//! One endpoint, one TLS verification switch, one optional per-request
//! timeout and the retry policy.

use crate::http::retry::RetryPolicy;
use crate::{Error, Result};
use reqwest::Url;
use std::time::Duration;

/// Configuration for [`HttpTransport`](crate::http::HttpTransport)
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Base URL of the Zealot service
    pub endpoint: Url,
    /// Whether to validate TLS certificates
    pub verify_ssl: bool,
    /// Per-request timeout; `None` leaves the HTTP library default in place
    pub timeout: Option<Duration>,
    /// Retry policy for failures that produced no response
    pub retry: RetryPolicy,
}

impl TransportConfig {
    /// Create a configuration for an endpoint, validating the URL
    pub fn new(endpoint: &str) -> Result<Self> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("endpoint", "endpoint is missing"));
        }

        let endpoint = Url::parse(trimmed).map_err(|e| {
            Error::validation("endpoint", format!("invalid endpoint URL {}: {}", trimmed, e))
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::validation(
                "endpoint",
                format!("unsupported endpoint scheme: {}", endpoint.scheme()),
            ));
        }

        Ok(Self {
            endpoint,
            verify_ssl: true,
            timeout: None,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TransportConfig::new("https://zealot.example.com").unwrap();
        assert!(config.verify_ssl);
        assert_eq!(config.timeout, None);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(matches!(
            TransportConfig::new("  "),
            Err(Error::Validation { ref field, .. }) if field == "endpoint"
        ));
        assert!(TransportConfig::new("not a url").is_err());
        assert!(TransportConfig::new("ftp://zealot.example.com").is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = TransportConfig::new("http://localhost:3000")
            .unwrap()
            .with_verify_ssl(false)
            .with_timeout(Some(Duration::from_secs(30)))
            .with_retry(RetryPolicy::disabled());
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.retry.max_attempts, 1);
    }
}

//! HTTP layer for talking to the Zealot service
//!
//! This module provides:
//! - A transport seam with a `reqwest` implementation
//! - Multipart and url-encoded request bodies
//! - Bounded retry for failures that produced no response
//! - Response classification into outcomes

pub mod classify;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use classify::{classify, classify_response, ResponseContext};
pub use config::TransportConfig;
pub use error::TransportFailure;
pub use retry::{RetryDecision, RetryHandler, RetryPolicy};
pub use transport::{ApiRequest, FilePart, HttpTransport, RawResponse, RequestBody, Transport};

pub use reqwest::{Method, StatusCode};

//! Transport seam and its reqwest-backed implementation
//!
//! [`ApiRequest`] is a fully owned description of one call. The transport
//! turns it into a fresh `reqwest` request on every attempt, so a retried
//! call is rebuilt rather than mutated.

use crate::http::config::TransportConfig;
use crate::http::error::TransportFailure;
use crate::http::retry::{RetryDecision, RetryHandler};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client as ReqwestClient, Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    /// Text fields plus one binary file part
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

/// Binary file part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    /// Shared with every attempt; cloning does not copy the contents
    pub bytes: Bytes,
}

/// One service call, independent of the HTTP library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the endpoint, e.g. `/api/apps/upload`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Look up a text field in the query, form or multipart fields
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match &self.body {
            RequestBody::Empty => &self.query,
            RequestBody::Form(fields) => fields,
            RequestBody::Multipart { fields, .. } => fields,
        };
        fields
            .iter()
            .chain(self.query.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Response that reached the client, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body parsed as JSON, when it is JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the service
///
/// HTTP error statuses are successful sends; only failures to obtain a
/// response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportFailure>;
}

/// Transport backed by a configured `reqwest` client with automatic retry
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint
    pub fn new(config: TransportConfig) -> crate::Result<Self> {
        let client = ReqwestClient::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(concat!("zealot-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build the full URL from the endpoint and a request path
    fn url_for(&self, path: &str) -> Result<Url, TransportFailure> {
        let mut base = self.config.endpoint.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        base.join(path.trim_start_matches('/'))
            .map_err(|e| TransportFailure::connection(format!("Invalid request path {}: {}", path, e)))
    }

    fn build(&self, request: &ApiRequest, url: Url) -> Result<reqwest::Request, TransportFailure> {
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart { fields, file } => {
                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), value.clone());
                }
                let length = file.bytes.len() as u64;
                let part = Part::stream_with_length(Body::from(file.bytes.clone()), length)
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)
                    .map_err(TransportFailure::from_request_error)?;
                builder.multipart(form.part(file.field.clone(), part))
            }
        };

        builder.build().map_err(TransportFailure::from_request_error)
    }

    async fn send_once(&self, request: &ApiRequest, url: &Url) -> Result<RawResponse, TransportFailure> {
        let http_request = self.build(request, url.clone())?;
        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(TransportFailure::from_request_error)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(TransportFailure::from_request_error)?;

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportFailure> {
        let url = self.url_for(&request.path)?;
        let mut handler = RetryHandler::new(self.config.retry.clone());

        loop {
            debug!(method = %request.method, url = %url, "Sending request");

            match self.send_once(request, &url).await {
                Ok(response) => {
                    debug!(status = response.status, "Received response");
                    return Ok(response);
                }
                Err(failure) => match handler.should_retry(&failure, &request.method) {
                    RetryDecision::Retry { delay } => {
                        warn!(
                            attempt = handler.attempts(),
                            delay_secs = delay.as_secs_f64(),
                            "Request {} {} failed, retrying: {}",
                            request.method,
                            request.path,
                            failure
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::NoRetry => return Err(failure),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::config::TransportConfig;

    fn transport(endpoint: &str) -> HttpTransport {
        HttpTransport::new(TransportConfig::new(endpoint).unwrap()).unwrap()
    }

    #[test]
    fn test_url_building_keeps_endpoint_path() {
        let t = transport("https://zealot.example.com/");
        assert_eq!(
            t.url_for("/api/apps/upload").unwrap().as_str(),
            "https://zealot.example.com/api/apps/upload"
        );

        let t = transport("https://example.com/zealot");
        assert_eq!(
            t.url_for("/api/devices/abc").unwrap().as_str(),
            "https://example.com/zealot/api/devices/abc"
        );
    }

    #[test]
    fn test_request_field_lookup() {
        let request = ApiRequest::new(Method::GET, "/api/apps/version_exist")
            .with_query(vec![("bundle_id".to_string(), "im.ews.zealot".to_string())]);
        assert_eq!(request.field("bundle_id"), Some("im.ews.zealot"));
        assert_eq!(request.field("git_commit"), None);
    }

    #[test]
    fn test_raw_response_helpers() {
        let response = RawResponse::new(201, r#"{"id":2}"#);
        assert!(response.is_success());
        assert_eq!(response.json().unwrap()["id"], 2);

        let response = RawResponse::new(502, "<html>bad gateway</html>");
        assert!(!response.is_success());
        assert!(response.json().is_none());
    }
}

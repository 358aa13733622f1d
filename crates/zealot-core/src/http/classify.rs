//! Response classification
//!
//! Turns whatever the transport produced into an [`Outcome`]. Classification
//! never fails and never looks at the fail-on-error policy; escalation is the
//! reporter's job.

use crate::http::error::TransportFailure;
use crate::http::transport::RawResponse;
use crate::types::{
    AppRelease, DebugFileReceipt, ExistingRelease, Outcome, Payload, TransportErrorKind,
};
use serde_json::{Map, Value};

/// Which service call produced the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseContext {
    AppUpload,
    DebugFileUpload,
    VersionCheck,
    DeviceUpsert,
}

/// Classify a transport result for the given call
pub fn classify(
    response: Result<&RawResponse, &TransportFailure>,
    context: ResponseContext,
) -> Outcome {
    match response {
        Ok(response) => classify_response(Some(response), context),
        Err(failure) => Outcome::TransportError { kind: failure.kind },
    }
}

/// Classify a response that may be missing entirely
pub fn classify_response(response: Option<&RawResponse>, context: ResponseContext) -> Outcome {
    let Some(response) = response else {
        return Outcome::TransportError {
            kind: TransportErrorKind::Connection,
        };
    };

    // The service answers an unknown version with 404 and an error body
    if context == ResponseContext::VersionCheck && response.status == 404 {
        return Outcome::NotFound;
    }

    let body = response.json();

    if let Some(message) = body.as_ref().and_then(error_message) {
        return Outcome::ServiceError {
            status: Some(response.status),
            message,
        };
    }

    match context {
        ResponseContext::VersionCheck => match response.status {
            200 => Outcome::Success {
                payload: Payload::ExistingVersion(existing_release(body.as_ref())),
            },
            404 => Outcome::NotFound,
            status => service_error(status, response),
        },
        _ if !response.is_success() => service_error(response.status, response),
        ResponseContext::AppUpload => Outcome::Success {
            payload: Payload::App(app_release(body.as_ref())),
        },
        ResponseContext::DebugFileUpload => Outcome::Success {
            payload: Payload::DebugFile(debug_file_receipt(body)),
        },
        ResponseContext::DeviceUpsert => Outcome::Success {
            payload: Payload::Device(body.unwrap_or(Value::Null)),
        },
    }
}

fn service_error(status: u16, response: &RawResponse) -> Outcome {
    Outcome::ServiceError {
        status: Some(status),
        message: response.body.clone(),
    }
}

/// Content of a non-null `error` field
fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn int_field(body: Option<&Value>, key: &str) -> Option<i64> {
    let value = body?.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// String fields also accept numbers; build counters often arrive as integers
fn string_field(body: Option<&Value>, key: &str) -> Option<String> {
    match body?.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn app_release(body: Option<&Value>) -> AppRelease {
    AppRelease {
        app_id: int_field(body.and_then(|b| b.get("app")), "id"),
        release_id: int_field(body, "id"),
        release_url: string_field(body, "release_url"),
        install_url: string_field(body, "install_url"),
        qrcode_url: string_field(body, "qrcode_url"),
    }
}

fn existing_release(body: Option<&Value>) -> ExistingRelease {
    ExistingRelease {
        release_id: int_field(body, "id"),
        release_version: string_field(body, "release_version"),
        build_version: string_field(body, "build_version"),
        version: string_field(body, "version"),
        release_url: string_field(body, "release_url"),
        install_url: string_field(body, "install_url"),
        qrcode_url: string_field(body, "qrcode_url"),
    }
}

fn debug_file_receipt(body: Option<Value>) -> DebugFileReceipt {
    let Some(Value::Object(mut fields)) = body else {
        return DebugFileReceipt::default();
    };

    let metadata = match fields.remove("metadata") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect::<Vec<Map<String, Value>>>(),
        _ => Vec::new(),
    };

    DebugFileReceipt {
        metadata,
        fields: fields.into_iter().collect(),
    }
}

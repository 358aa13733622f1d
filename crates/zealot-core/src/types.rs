//! Core data types shared across the Zealot client
//!
//! Outcomes, payloads extracted from successful responses, and the device
//! sync records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Network-level failure kinds the caller can tell apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The host could not be reached
    Connection,
    /// The host was reached but did not answer in time
    Timeout,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connection => write!(f, "connection failed"),
            TransportErrorKind::Timeout => write!(f, "timed out"),
        }
    }
}

/// Release created by an app upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppRelease {
    pub app_id: Option<i64>,
    pub release_id: Option<i64>,
    pub release_url: Option<String>,
    pub install_url: Option<String>,
    pub qrcode_url: Option<String>,
}

/// Latest release matching a version check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingRelease {
    pub release_id: Option<i64>,
    pub release_version: Option<String>,
    pub build_version: Option<String>,
    pub version: Option<String>,
    pub release_url: Option<String>,
    pub install_url: Option<String>,
    pub qrcode_url: Option<String>,
}

/// Receipt for an uploaded debug-file archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugFileReceipt {
    /// Per-architecture metadata entries reported by the service
    pub metadata: Vec<Map<String, Value>>,
    /// Remaining top-level fields of the response body
    pub fields: BTreeMap<String, Value>,
}

/// Payload carried by a successful outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    App(AppRelease),
    DebugFile(DebugFileReceipt),
    ExistingVersion(ExistingRelease),
    Device(Value),
}

/// Classified result of a single service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The call succeeded
    Success { payload: Payload },
    /// Version check answered "does not exist"; not an error
    NotFound,
    /// The service reported an error condition
    ServiceError { status: Option<u16>, message: String },
    /// The request never produced a response
    TransportError { kind: TransportErrorKind },
}

impl Outcome {
    /// Whether this outcome is a failure subject to the fail-on-error policy
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::ServiceError { .. } | Outcome::TransportError { .. }
        )
    }

    /// Whether a version check found the version on the service
    pub fn already_exists(&self) -> bool {
        matches!(
            self,
            Outcome::Success {
                payload: Payload::ExistingVersion(_)
            }
        )
    }

    pub fn app_release(&self) -> Option<&AppRelease> {
        match self {
            Outcome::Success {
                payload: Payload::App(release),
            } => Some(release),
            _ => None,
        }
    }

    pub fn existing_release(&self) -> Option<&ExistingRelease> {
        match self {
            Outcome::Success {
                payload: Payload::ExistingVersion(release),
            } => Some(release),
            _ => None,
        }
    }

    pub fn debug_file_receipt(&self) -> Option<&DebugFileReceipt> {
        match self {
            Outcome::Success {
                payload: Payload::DebugFile(receipt),
            } => Some(receipt),
            _ => None,
        }
    }
}

/// A device registered in the external device directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub udid: String,
    pub name: String,
    pub model: String,
}

/// Per-device sync status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    Failed(String),
}

/// Result of reconciling one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSyncResult {
    pub udid: String,
    pub status: SyncStatus,
}

/// A device that failed to sync and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub udid: String,
    pub reason: String,
}

/// Ordered results of one device sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    results: Vec<DeviceSyncResult>,
}

impl SyncOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result; results keep the order devices were processed in
    pub fn record(&mut self, udid: impl Into<String>, status: SyncStatus) {
        self.results.push(DeviceSyncResult {
            udid: udid.into(),
            status,
        });
    }

    pub fn results(&self) -> &[DeviceSyncResult] {
        &self.results
    }

    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == SyncStatus::Synced)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    pub fn failures(&self) -> Vec<SyncFailure> {
        self.results
            .iter()
            .filter_map(|r| match &r.status {
                SyncStatus::Failed(reason) => Some(SyncFailure {
                    udid: r.udid.clone(),
                    reason: reason.clone(),
                }),
                SyncStatus::Synced => None,
            })
            .collect()
    }

    /// Aggregate view exposed to callers
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            failures: self.failures(),
        }
    }
}

/// Aggregated device sync counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<SyncFailure>,
}

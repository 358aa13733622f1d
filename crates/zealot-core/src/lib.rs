//! Zealot Core - client library for the Zealot release-management service
//!
//! This crate uploads app packages and debug-symbol archives, checks whether a
//! build version already exists, and reconciles a device directory against the
//! service.
//!
//! # Main Components
//!
//! - **Request Builders**: validate caller input into immutable request values
//! - **Transport**: HTTP with TLS switch, optional timeout and bounded retry
//! - **Response Classifier**: maps any transport result into an [`Outcome`]
//! - **Reconciler**: sequential device upserts with per-device isolation
//! - **Reporting**: fail-on-error policy and the invocation context
//!
//! # Example
//!
//! ```no_run
//! use zealot_core::{
//!     build_version_check_query, InvocationContext, Operation, Reporter,
//!     TransportConfig, VersionCheckParams, ZealotClient,
//! };
//!
//! async fn example() -> zealot_core::Result<()> {
//!     let client = ZealotClient::connect(TransportConfig::new("https://zealot.example.com")?)?;
//!     let query = build_version_check_query(&VersionCheckParams {
//!         token: "token".to_string(),
//!         channel_key: "channel".to_string(),
//!         bundle_id: "im.ews.zealot".to_string(),
//!         git_commit: Some("ec7b585".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     let mut context = InvocationContext::new();
//!     let outcome = client.check_version(&query).await;
//!     Reporter::new(false).report(Operation::CheckVersion, outcome, &mut context)?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collaborators;
pub mod debug_file;
pub mod error;
pub mod http;
pub mod report;
pub mod request;
pub mod sync;
pub mod types;

pub use client::ZealotClient;
pub use collaborators::{
    ArchiveGenerator, CiContext, CiDetector, DeviceDirectory, FileProbe, LocalFiles,
    NoCiDetection,
};
pub use debug_file::{
    generate_archive, resolve_debug_file_payload, select_archive_plan, AndroidArchiveConfig,
    AppleArchiveConfig, ArchivePlan, BuildContext, DebugFileParams, Platform,
};
pub use error::{Error, Result};
pub use http::{HttpTransport, RetryPolicy, Transport, TransportConfig, TransportFailure};
pub use report::{InvocationContext, Operation, Reporter};
pub use request::{
    build_debug_file_request, build_upload_request, build_version_check_query,
    encode_custom_fields, validate_token, DebugFileUploadRequest, OptionalFields, UploadParams,
    UploadRequest, VersionCheckParams, VersionCheckQuery, VersionIdentity,
};
pub use sync::{reconcile, sync_devices, DeviceSync};
pub use types::{
    AppRelease, DebugFileReceipt, Device, DeviceSyncResult, ExistingRelease, Outcome, Payload,
    SyncFailure, SyncOutcome, SyncStatus, SyncSummary, TransportErrorKind,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Device sync reconciler
//!
//! Devices are upserted one at a time in input order. A failing device is
//! recorded and the batch moves on.

use crate::client::ZealotClient;
use crate::collaborators::DeviceDirectory;
use crate::http::Transport;
use crate::request::validate_token;
use crate::types::{Device, Outcome, SyncOutcome, SyncStatus};
use crate::Result;
use tracing::{debug, info, warn};

/// Upsert every device and collect per-device results
pub async fn reconcile<T: Transport>(
    devices: &[Device],
    client: &ZealotClient<T>,
    token: &str,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::new();

    for device in devices {
        let status = match client.upsert_device(token, device).await {
            Outcome::Success { .. } => SyncStatus::Synced,
            failure => {
                let reason = failure_reason(&failure);
                warn!(udid = %device.udid, "Device sync failed: {}", reason);
                SyncStatus::Failed(reason)
            }
        };
        outcome.record(device.udid.clone(), status);
    }

    info!(
        success = outcome.success_count(),
        failed = outcome.failure_count(),
        "Device sync finished"
    );
    outcome
}

/// Devices listed from a directory and the results of syncing them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSync {
    pub devices: Vec<Device>,
    pub outcome: SyncOutcome,
}

/// List devices from the directory, then reconcile them
///
/// The token is checked before the directory is read.
pub async fn sync_devices<T: Transport>(
    directory: &dyn DeviceDirectory,
    client: &ZealotClient<T>,
    token: &str,
) -> Result<DeviceSync> {
    validate_token(token)?;
    let devices = directory.devices()?;
    debug!(count = devices.len(), "Loaded devices from directory");
    let outcome = reconcile(&devices, client, token).await;
    Ok(DeviceSync { devices, outcome })
}

fn failure_reason(outcome: &Outcome) -> String {
    match outcome {
        Outcome::TransportError { kind } => kind.to_string(),
        Outcome::ServiceError {
            status: Some(status),
            message,
        } => format!("[{}] {}", status, message),
        Outcome::ServiceError {
            status: None,
            message,
        } => message.clone(),
        Outcome::NotFound => "not found".to_string(),
        Outcome::Success { .. } => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::http::{ApiRequest, RawResponse, TransportFailure};
    use crate::types::TransportErrorKind;
    use async_trait::async_trait;

    struct ByPath;

    #[async_trait]
    impl Transport for ByPath {
        async fn send(&self, request: &ApiRequest) -> std::result::Result<RawResponse, TransportFailure> {
            if request.path.ends_with("/bad") {
                Ok(RawResponse::new(422, r#"{"error":"udid invalid"}"#))
            } else {
                Ok(RawResponse::new(200, r#"{"udid":"ok"}"#))
            }
        }
    }

    fn device(udid: &str) -> Device {
        Device {
            udid: udid.to_string(),
            name: format!("{} name", udid),
            model: "iPhone".to_string(),
        }
    }

    #[tokio::test]
    async fn test_service_error_reason_includes_status() {
        let client = ZealotClient::new(ByPath);
        let outcome = reconcile(&[device("good"), device("bad")], &client, "t").await;

        let summary = outcome.summary();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failures[0].udid, "bad");
        assert_eq!(summary.failures[0].reason, "[422] udid invalid");
    }

    #[tokio::test]
    async fn test_empty_device_list() {
        let client = ZealotClient::new(ByPath);
        let outcome = reconcile(&[], &client, "t").await;
        assert_eq!(outcome.summary().success_count, 0);
        assert_eq!(outcome.summary().failure_count, 0);
    }

    #[test]
    fn test_failure_reason_for_transport_kinds() {
        assert_eq!(
            failure_reason(&Outcome::TransportError {
                kind: TransportErrorKind::Connection
            }),
            "connection failed"
        );
        assert_eq!(
            failure_reason(&Outcome::TransportError {
                kind: TransportErrorKind::Timeout
            }),
            "timed out"
        );
    }

    struct Broken;

    impl DeviceDirectory for Broken {
        fn devices(&self) -> Result<Vec<Device>> {
            Err(Error::configuration("device directory unavailable"))
        }
    }

    struct Listed(Vec<Device>);

    impl DeviceDirectory for Listed {
        fn devices(&self) -> Result<Vec<Device>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_sync_returns_listed_devices_with_results() {
        let client = ZealotClient::new(ByPath);
        let directory = Listed(vec![device("good"), device("bad")]);

        let sync = sync_devices(&directory, &client, "t").await.unwrap();
        assert_eq!(sync.devices, directory.0);
        assert_eq!(sync.outcome.success_count(), 1);
        assert_eq!(sync.outcome.failures()[0].udid, "bad");
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let client = ZealotClient::new(ByPath);
        assert!(sync_devices(&Broken, &client, "t").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_token_rejected_before_listing() {
        let client = ZealotClient::new(ByPath);
        assert!(matches!(
            sync_devices(&Broken, &client, "").await,
            Err(Error::Validation { .. })
        ));
    }
}

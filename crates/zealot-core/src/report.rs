//! Outcome reporting
//!
//! The [`Reporter`] applies the fail-on-error policy to classified outcomes
//! and records what later steps of the same invocation need to read into a
//! caller-owned [`InvocationContext`].

use crate::types::{Outcome, SyncOutcome, SyncSummary, TransportErrorKind};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Service call being reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UploadApp,
    CheckVersion,
    UploadDebugFile,
    SyncDevices,
}

impl Operation {
    fn action(&self) -> &'static str {
        match self {
            Operation::UploadApp => "uploading to Zealot",
            Operation::CheckVersion => "checking app version from Zealot",
            Operation::UploadDebugFile => "uploading debug file to Zealot",
            Operation::SyncDevices => "syncing devices to Zealot",
        }
    }

    fn timeout_message(&self) -> &'static str {
        match self {
            Operation::UploadApp => "Uploading build to Zealot timed out",
            Operation::CheckVersion => "Check app version from Zealot timed out",
            Operation::UploadDebugFile => "Uploading debug file to Zealot timed out",
            Operation::SyncDevices => "Syncing devices to Zealot timed out",
        }
    }

    /// Human-readable message for a failure outcome
    pub fn failure_message(&self, outcome: &Outcome) -> Option<String> {
        match outcome {
            Outcome::ServiceError { status, message } => Some(format!(
                "Error {} [{}]: {}",
                self.action(),
                status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                message
            )),
            Outcome::TransportError {
                kind: TransportErrorKind::Timeout,
            } => Some(self.timeout_message().to_string()),
            Outcome::TransportError {
                kind: TransportErrorKind::Connection,
            } => Some(format!("Error {}: connection failed", self.action())),
            Outcome::Success { .. } | Outcome::NotFound => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::UploadApp => "upload",
            Operation::CheckVersion => "version check",
            Operation::UploadDebugFile => "debug file upload",
            Operation::SyncDevices => "device sync",
        };
        write!(f, "{}", name)
    }
}

/// Values produced by one invocation chain for the steps after it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub app_id: Option<i64>,
    pub release_id: Option<i64>,
    pub release_url: Option<String>,
    pub install_url: Option<String>,
    pub qrcode_url: Option<String>,
    pub version_existed: Option<bool>,
    pub last_error: Option<String>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn absorb(&mut self, outcome: &Outcome) {
        if let Some(release) = outcome.app_release() {
            self.app_id = release.app_id;
            self.release_id = release.release_id;
            self.release_url = release.release_url.clone();
            self.install_url = release.install_url.clone();
            self.qrcode_url = release.qrcode_url.clone();
        } else if outcome.already_exists() {
            self.version_existed = Some(true);
        } else if *outcome == Outcome::NotFound {
            self.version_existed = Some(false);
        }
    }
}

/// Applies the fail-on-error policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub fail_on_error: bool,
}

impl Reporter {
    pub fn new(fail_on_error: bool) -> Self {
        Self { fail_on_error }
    }

    /// Report a classified outcome
    ///
    /// Successes and `NotFound` update the context and pass through. A failure
    /// is recorded as the last error, then either escalated to
    /// [`Error::Fatal`] or passed through after a warning.
    pub fn report(
        &self,
        operation: Operation,
        outcome: Outcome,
        context: &mut InvocationContext,
    ) -> crate::Result<Outcome> {
        let Some(message) = operation.failure_message(&outcome) else {
            context.absorb(&outcome);
            info!("Zealot {} succeeded", operation);
            return Ok(outcome);
        };

        context.last_error = Some(message.clone());

        if self.fail_on_error {
            error!("{}", message);
            return Err(Error::Fatal { message });
        }

        warn!("{}", message);
        Ok(outcome)
    }

    /// Record a local failure and hand it back for propagation
    ///
    /// Validation and generation failures abort regardless of the policy.
    pub fn abort(&self, err: Error, context: &mut InvocationContext) -> Error {
        error!("{}", err);
        context.last_error = Some(err.to_string());
        err
    }

    /// Summarize a sync run; individual device failures never escalate
    pub fn report_sync(&self, outcome: &SyncOutcome) -> SyncSummary {
        let summary = outcome.summary();
        info!(
            "Successful synced devices, success: {}, failed: {}",
            summary.success_count, summary.failure_count
        );
        for failure in &summary.failures {
            warn!(udid = %failure.udid, "Device not synced: {}", failure.reason);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppRelease, ExistingRelease, Payload, SyncStatus};

    fn service_error() -> Outcome {
        Outcome::ServiceError {
            status: Some(422),
            message: "channel key invalid".to_string(),
        }
    }

    #[test]
    fn test_failure_degrades_to_warning() {
        let mut context = InvocationContext::new();
        let outcome = Reporter::new(false)
            .report(Operation::UploadApp, service_error(), &mut context)
            .unwrap();

        assert!(outcome.is_failure());
        assert_eq!(
            context.last_error.as_deref(),
            Some("Error uploading to Zealot [422]: channel key invalid")
        );
    }

    #[test]
    fn test_failure_escalates_when_fail_on_error() {
        let mut context = InvocationContext::new();
        let err = Reporter::new(true)
            .report(
                Operation::CheckVersion,
                Outcome::TransportError {
                    kind: TransportErrorKind::Timeout,
                },
                &mut context,
            )
            .unwrap_err();

        assert!(matches!(err, Error::Fatal { ref message } if message == "Check app version from Zealot timed out"));
        assert_eq!(
            context.last_error.as_deref(),
            Some("Check app version from Zealot timed out")
        );
    }

    #[test]
    fn test_not_found_is_not_a_failure() {
        let mut context = InvocationContext::new();
        let outcome = Reporter::new(true)
            .report(Operation::CheckVersion, Outcome::NotFound, &mut context)
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(context.version_existed, Some(false));
        assert_eq!(context.last_error, None);
    }

    #[test]
    fn test_success_fills_context() {
        let mut context = InvocationContext::new();
        let reporter = Reporter::new(true);

        let upload = Outcome::Success {
            payload: Payload::App(AppRelease {
                app_id: Some(1),
                release_id: Some(2),
                release_url: Some("https://x/r/2".to_string()),
                ..Default::default()
            }),
        };
        reporter
            .report(Operation::UploadApp, upload, &mut context)
            .unwrap();

        let existing = Outcome::Success {
            payload: Payload::ExistingVersion(ExistingRelease::default()),
        };
        reporter
            .report(Operation::CheckVersion, existing, &mut context)
            .unwrap();

        assert_eq!(context.app_id, Some(1));
        assert_eq!(context.release_id, Some(2));
        assert_eq!(context.release_url.as_deref(), Some("https://x/r/2"));
        assert_eq!(context.version_existed, Some(true));
    }

    #[test]
    fn test_abort_records_last_error() {
        let mut context = InvocationContext::new();
        let err = Reporter::new(false).abort(
            Error::validation("bundle_id", "bundle id is missing"),
            &mut context,
        );
        assert!(err.is_always_fatal());
        assert_eq!(
            context.last_error.as_deref(),
            Some("Validation error: bundle_id - bundle id is missing")
        );
    }

    #[test]
    fn test_report_sync_never_fails() {
        let mut outcome = SyncOutcome::new();
        outcome.record("a", SyncStatus::Synced);
        outcome.record("b", SyncStatus::Failed("timed out".to_string()));

        let summary = Reporter::new(true).report_sync(&outcome);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
    }

    #[test]
    fn test_connection_failure_message() {
        let message = Operation::UploadDebugFile.failure_message(&Outcome::TransportError {
            kind: TransportErrorKind::Connection,
        });
        assert_eq!(
            message.as_deref(),
            Some("Error uploading debug file to Zealot: connection failed")
        );
    }
}

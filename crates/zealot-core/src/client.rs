//! High-level client chaining request values through transport and classifier
//!
//! Every operation returns an [`Outcome`]; only local failures such as an
//! unreadable upload file surface as errors. Escalation of remote failures is
//! left to [`Reporter`](crate::report::Reporter).

use crate::http::{
    classify, HttpTransport, ResponseContext, Transport, TransportConfig,
};
use crate::request::{
    device_upsert_request, DebugFileUploadRequest, UploadRequest, VersionCheckQuery,
};
use crate::types::{Device, Outcome};
use crate::Result;
use tracing::{debug, info};

/// Client for one Zealot endpoint
pub struct ZealotClient<T: Transport = HttpTransport> {
    transport: T,
}

impl ZealotClient<HttpTransport> {
    /// Create a client talking HTTP to the configured endpoint
    pub fn connect(config: TransportConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> ZealotClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Upload an app package
    pub async fn upload_app(&self, request: &UploadRequest) -> Result<Outcome> {
        info!(file = %request.file.path.display(), "Uploading build to Zealot");
        let api_request = request.to_api_request().await?;
        let result = self.transport.send(&api_request).await;
        Ok(classify(result.as_ref(), ResponseContext::AppUpload))
    }

    /// Ask whether a version already exists on the channel
    pub async fn check_version(&self, query: &VersionCheckQuery) -> Outcome {
        debug!(bundle_id = %query.bundle_id, "Checking app version on Zealot");
        let result = self.transport.send(&query.to_api_request()).await;
        classify(result.as_ref(), ResponseContext::VersionCheck)
    }

    /// Upload a debug-symbol archive
    pub async fn upload_debug_file(&self, request: &DebugFileUploadRequest) -> Result<Outcome> {
        info!(file = %request.file.path.display(), "Uploading debug file to Zealot");
        let api_request = request.to_api_request().await?;
        let result = self.transport.send(&api_request).await;
        Ok(classify(result.as_ref(), ResponseContext::DebugFileUpload))
    }

    /// Create or update one device keyed by its UDID
    pub async fn upsert_device(&self, token: &str, device: &Device) -> Outcome {
        debug!(udid = %device.udid, "Syncing device");
        let request = device_upsert_request(token, &device.udid, &device.name, &device.model);
        let result = self.transport.send(&request).await;
        classify(result.as_ref(), ResponseContext::DeviceUpsert)
    }
}

//! Request builders for the Zealot API
//!
//! Builders validate caller input before anything touches the network and
//! produce immutable request values. Optional fields are normalized so that a
//! field is either absent or non-empty; the service treats presence as
//! meaningful.

use crate::collaborators::{CiContext, CiDetector, FileProbe};
use crate::http::{ApiRequest, FilePart, Method, RequestBody};
use crate::{Error, Result};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const UPLOAD_APP_PATH: &str = "/api/apps/upload";
pub const VERSION_EXIST_PATH: &str = "/api/apps/version_exist";
pub const DEBUG_FILE_UPLOAD_PATH: &str = "/api/debug_files/upload";
pub const DEVICES_PATH: &str = "/api/devices";

const OCTET_STREAM: &str = "application/octet-stream";

/// Everything but RFC 3986 unreserved characters is escaped in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Binary file sent as the `file` part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub path: PathBuf,
    pub content_type: String,
}

impl BinaryPayload {
    pub fn octet_stream(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: OCTET_STREAM.to_string(),
        }
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string())
    }

    /// Read the payload into a multipart file part
    pub async fn to_file_part(&self) -> Result<FilePart> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| Error::Io {
            message: format!("Failed to read {}: {}", self.path.display(), e),
            source: e,
        })?;

        Ok(FilePart {
            field: "file".to_string(),
            file_name: self.file_name(),
            content_type: self.content_type.clone(),
            bytes: Bytes::from(bytes),
        })
    }
}

/// Caller-supplied parameters for an app upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadParams {
    pub token: String,
    pub channel_key: String,
    pub file: PathBuf,
    pub name: Option<String>,
    pub changelog: Option<String>,
    pub release_type: Option<String>,
    pub slug: Option<String>,
    pub branch: Option<String>,
    pub source: Option<String>,
    pub git_commit: Option<String>,
    pub password: Option<String>,
    /// Arbitrary structured fields, sent as compact JSON
    pub custom_fields: Option<Value>,
    pub ci_url: Option<String>,
}

/// Optional upload fields; every present value is non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionalFields {
    pub name: Option<String>,
    pub changelog: Option<String>,
    pub release_type: Option<String>,
    pub slug: Option<String>,
    pub branch: Option<String>,
    pub source: Option<String>,
    pub git_commit: Option<String>,
    pub password: Option<String>,
    /// Already encoded as a JSON string
    pub custom_fields: Option<String>,
    pub ci_url: Option<String>,
}

impl OptionalFields {
    /// Encode present fields only, in wire order
    pub fn present_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("name", &self.name),
            ("changelog", &self.changelog),
            ("release_type", &self.release_type),
            ("slug", &self.slug),
            ("branch", &self.branch),
            ("source", &self.source),
            ("git_commit", &self.git_commit),
            ("password", &self.password),
            ("custom_fields", &self.custom_fields),
            ("ci_url", &self.ci_url),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

/// A validated app upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub token: String,
    pub channel_key: String,
    pub file: BinaryPayload,
    pub optional: OptionalFields,
}

impl UploadRequest {
    /// Text fields of the multipart form, token first
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("token".to_string(), self.token.clone()),
            ("channel_key".to_string(), self.channel_key.clone()),
        ];
        fields.extend(
            self.optional
                .present_fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v)),
        );
        fields
    }

    pub async fn to_api_request(&self) -> Result<ApiRequest> {
        let file = self.file.to_file_part().await?;
        Ok(
            ApiRequest::new(Method::POST, UPLOAD_APP_PATH).with_body(RequestBody::Multipart {
                fields: self.form_fields(),
                file,
            }),
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Reject an empty user token
pub fn validate_token(token: &str) -> Result<()> {
    require(
        token,
        "token",
        "No user token for Zealot given, pass using `token: 'token'`",
    )
}

fn require(value: &str, field: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(field, message));
    }
    Ok(())
}

fn require_readable(path: &Path, files: &dyn FileProbe) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation("file", "Couldn't pass empty to file"));
    }
    if !files.is_readable(path) {
        return Err(Error::validation(
            "file",
            format!("Couldn't find file at path '{}'", path.display()),
        ));
    }
    Ok(())
}

/// Serialize custom fields to the compact JSON carried by `custom_fields`
///
/// Null and empty collections count as absent.
pub fn encode_custom_fields(fields: &Value) -> Result<Option<String>> {
    let empty = match fields {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(fields)?))
}

/// Build an app upload request
///
/// `source`, `ci_url`, `branch` and `git_commit` that were not supplied are
/// taken from the CI detector, which is consulted at most once.
pub fn build_upload_request(
    params: &UploadParams,
    files: &dyn FileProbe,
    ci: &dyn CiDetector,
) -> Result<UploadRequest> {
    validate_token(&params.token)?;
    require(&params.channel_key, "channel_key", "channel key is missing")?;
    require_readable(&params.file, files)?;

    let mut optional = OptionalFields {
        name: non_empty(&params.name),
        changelog: non_empty(&params.changelog),
        release_type: non_empty(&params.release_type),
        slug: non_empty(&params.slug),
        branch: non_empty(&params.branch),
        source: non_empty(&params.source),
        git_commit: non_empty(&params.git_commit),
        password: non_empty(&params.password),
        custom_fields: match &params.custom_fields {
            Some(fields) => encode_custom_fields(fields)?,
            None => None,
        },
        ci_url: non_empty(&params.ci_url),
    };

    let needs_ci = optional.source.is_none()
        || optional.ci_url.is_none()
        || optional.branch.is_none()
        || optional.git_commit.is_none();
    if needs_ci {
        if let Some(detected) = ci.detect() {
            fill_from_ci(&mut optional, detected);
        }
    }

    Ok(UploadRequest {
        token: params.token.clone(),
        channel_key: params.channel_key.clone(),
        file: BinaryPayload::octet_stream(&params.file),
        optional,
    })
}

fn fill_from_ci(optional: &mut OptionalFields, detected: CiContext) {
    let slots = [
        (&mut optional.source, detected.source),
        (&mut optional.ci_url, detected.ci_url),
        (&mut optional.branch, detected.branch),
        (&mut optional.git_commit, detected.git_commit),
    ];
    for (slot, value) in slots {
        if slot.is_none() {
            *slot = value.filter(|v| !v.is_empty());
        }
    }
}

/// Caller-supplied parameters for a version check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCheckParams {
    pub token: String,
    pub channel_key: String,
    pub bundle_id: String,
    pub release_version: Option<String>,
    pub build_version: Option<String>,
    pub git_commit: Option<String>,
}

/// How a version check identifies the build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionIdentity {
    /// At least one of the two is present
    Version {
        release_version: Option<String>,
        build_version: Option<String>,
    },
    GitCommit(String),
}

/// A validated version check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheckQuery {
    pub token: String,
    pub channel_key: String,
    pub bundle_id: String,
    pub identity: VersionIdentity,
}

impl VersionCheckQuery {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("token".to_string(), self.token.clone()),
            ("channel_key".to_string(), self.channel_key.clone()),
            ("bundle_id".to_string(), self.bundle_id.clone()),
        ];
        match &self.identity {
            VersionIdentity::Version {
                release_version,
                build_version,
            } => {
                if let Some(v) = release_version {
                    pairs.push(("release_version".to_string(), v.clone()));
                }
                if let Some(v) = build_version {
                    pairs.push(("build_version".to_string(), v.clone()));
                }
            }
            VersionIdentity::GitCommit(commit) => {
                pairs.push(("git_commit".to_string(), commit.clone()));
            }
        }
        pairs
    }

    pub fn to_api_request(&self) -> ApiRequest {
        ApiRequest::new(Method::GET, VERSION_EXIST_PATH).with_query(self.query_pairs())
    }
}

/// Build a version check query
///
/// Version fields take priority over `git_commit` when both are supplied.
pub fn build_version_check_query(params: &VersionCheckParams) -> Result<VersionCheckQuery> {
    validate_token(&params.token)?;
    require(&params.channel_key, "channel_key", "channel key is missing")?;
    require(&params.bundle_id, "bundle_id", "bundle id is missing")?;

    let release_version = non_empty(&params.release_version);
    let build_version = non_empty(&params.build_version);
    let git_commit = non_empty(&params.git_commit);

    let identity = if release_version.is_some() || build_version.is_some() {
        VersionIdentity::Version {
            release_version,
            build_version,
        }
    } else if let Some(commit) = git_commit {
        VersionIdentity::GitCommit(commit)
    } else {
        return Err(Error::validation(
            "release_version",
            "release_version + build_version or git_commit is missing",
        ));
    };

    Ok(VersionCheckQuery {
        token: params.token.clone(),
        channel_key: params.channel_key.clone(),
        bundle_id: params.bundle_id.clone(),
        identity,
    })
}

/// A validated debug-file upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugFileUploadRequest {
    pub token: String,
    pub channel_key: String,
    pub release_version: Option<String>,
    pub build_version: Option<String>,
    pub file: BinaryPayload,
}

impl DebugFileUploadRequest {
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("token".to_string(), self.token.clone()),
            ("channel_key".to_string(), self.channel_key.clone()),
        ];
        if let Some(v) = &self.release_version {
            fields.push(("release_version".to_string(), v.clone()));
        }
        if let Some(v) = &self.build_version {
            fields.push(("build_version".to_string(), v.clone()));
        }
        fields
    }

    pub async fn to_api_request(&self) -> Result<ApiRequest> {
        let file = self.file.to_file_part().await?;
        Ok(
            ApiRequest::new(Method::POST, DEBUG_FILE_UPLOAD_PATH).with_body(RequestBody::Multipart {
                fields: self.form_fields(),
                file,
            }),
        )
    }
}

/// Build a debug-file upload from an already resolved archive
pub fn build_debug_file_request(
    token: &str,
    channel_key: &str,
    release_version: &Option<String>,
    build_version: &Option<String>,
    archive: &Path,
    files: &dyn FileProbe,
) -> Result<DebugFileUploadRequest> {
    validate_token(token)?;
    require(channel_key, "channel_key", "channel key is missing")?;
    require_readable(archive, files)?;

    Ok(DebugFileUploadRequest {
        token: token.to_string(),
        channel_key: channel_key.to_string(),
        release_version: non_empty(release_version),
        build_version: non_empty(build_version),
        file: BinaryPayload::octet_stream(archive),
    })
}

/// Per-device upsert carrying the device's name and model
///
/// The udid is escaped so it always addresses a single path segment.
pub fn device_upsert_request(token: &str, udid: &str, name: &str, model: &str) -> ApiRequest {
    let udid = utf8_percent_encode(udid, PATH_SEGMENT);
    ApiRequest::new(Method::PUT, format!("{}/{}", DEVICES_PATH, udid)).with_body(RequestBody::Form(vec![
        ("token".to_string(), token.to_string()),
        ("name".to_string(), name.to_string()),
        ("model".to_string(), model.to_string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NoCiDetection;
    use serde_json::json;

    struct AllReadable;

    impl FileProbe for AllReadable {
        fn is_readable(&self, _path: &Path) -> bool {
            true
        }
    }

    struct NothingReadable;

    impl FileProbe for NothingReadable {
        fn is_readable(&self, _path: &Path) -> bool {
            false
        }
    }

    fn upload_params() -> UploadParams {
        UploadParams {
            token: "t0k3n".to_string(),
            channel_key: "ch4nn3l".to_string(),
            file: PathBuf::from("build/app.ipa"),
            ..Default::default()
        }
    }

    fn field_names(request: &UploadRequest) -> Vec<String> {
        request.form_fields().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_upload_includes_only_non_empty_fields() {
        let params = UploadParams {
            name: Some("Zealot".to_string()),
            changelog: Some(String::new()),
            branch: Some("develop".to_string()),
            password: None,
            ..upload_params()
        };

        let request = build_upload_request(&params, &AllReadable, &NoCiDetection).unwrap();
        assert_eq!(field_names(&request), ["token", "channel_key", "name", "branch"]);
        assert!(request.form_fields().iter().all(|(_, v)| !v.is_empty()));
    }

    #[test]
    fn test_upload_custom_fields_are_compact_json() {
        let params = UploadParams {
            custom_fields: Some(json!({"jira": "ZL-12", "qa": true})),
            ..upload_params()
        };
        let request = build_upload_request(&params, &AllReadable, &NoCiDetection).unwrap();
        assert_eq!(
            request.optional.custom_fields.as_deref(),
            Some(r#"{"jira":"ZL-12","qa":true}"#)
        );

        let params = UploadParams {
            custom_fields: Some(json!({})),
            ..upload_params()
        };
        let request = build_upload_request(&params, &AllReadable, &NoCiDetection).unwrap();
        assert_eq!(request.optional.custom_fields, None);
    }

    #[test]
    fn test_upload_validation_happens_first() {
        let params = UploadParams {
            token: String::new(),
            ..upload_params()
        };
        assert!(matches!(
            build_upload_request(&params, &AllReadable, &NoCiDetection),
            Err(Error::Validation { ref field, .. }) if field == "token"
        ));

        assert!(matches!(
            build_upload_request(&upload_params(), &NothingReadable, &NoCiDetection),
            Err(Error::Validation { ref field, .. }) if field == "file"
        ));
    }

    #[test]
    fn test_ci_detector_fills_missing_values_only() {
        let detector = || {
            Some(CiContext {
                source: Some("gitlab-ci".to_string()),
                ci_url: Some("https://ci/jobs/1".to_string()),
                branch: Some("main".to_string()),
                git_commit: Some(String::new()),
            })
        };
        let params = UploadParams {
            branch: Some("feature/x".to_string()),
            ..upload_params()
        };

        let request = build_upload_request(&params, &AllReadable, &detector).unwrap();
        assert_eq!(request.optional.source.as_deref(), Some("gitlab-ci"));
        assert_eq!(request.optional.ci_url.as_deref(), Some("https://ci/jobs/1"));
        assert_eq!(request.optional.branch.as_deref(), Some("feature/x"));
        assert_eq!(request.optional.git_commit, None);
    }

    #[test]
    fn test_upload_build_is_deterministic() {
        let params = UploadParams {
            name: Some("Zealot".to_string()),
            custom_fields: Some(json!({"b": 1, "a": [1, 2]})),
            ..upload_params()
        };
        let first = build_upload_request(&params, &AllReadable, &NoCiDetection).unwrap();
        let second = build_upload_request(&params, &AllReadable, &NoCiDetection).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_version_check_requires_bundle_id() {
        let params = VersionCheckParams {
            token: "t".to_string(),
            channel_key: "c".to_string(),
            git_commit: Some("ec7b585".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_version_check_query(&params),
            Err(Error::Validation { ref field, .. }) if field == "bundle_id"
        ));
    }

    #[test]
    fn test_version_check_requires_channel_key() {
        let params = VersionCheckParams {
            token: "t".to_string(),
            bundle_id: "im.ews.zealot".to_string(),
            git_commit: Some("ec7b585".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_version_check_query(&params),
            Err(Error::Validation { ref field, .. }) if field == "channel_key"
        ));
    }

    #[test]
    fn test_version_check_requires_identity() {
        let params = VersionCheckParams {
            token: "t".to_string(),
            channel_key: "c".to_string(),
            bundle_id: "im.ews.zealot".to_string(),
            release_version: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            build_version_check_query(&params),
            Err(Error::Validation { ref field, .. }) if field == "release_version"
        ));
    }

    #[test]
    fn test_version_fields_take_priority() {
        let params = VersionCheckParams {
            token: "t".to_string(),
            channel_key: "c".to_string(),
            bundle_id: "im.ews.zealot".to_string(),
            release_version: Some("1.0.0".to_string()),
            build_version: Some("1".to_string()),
            git_commit: Some("ec7b585".to_string()),
        };
        let query = build_version_check_query(&params).unwrap();
        let keys: Vec<_> = query.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            ["token", "channel_key", "bundle_id", "release_version", "build_version"]
        );

        let params = VersionCheckParams {
            release_version: None,
            build_version: None,
            ..params
        };
        let query = build_version_check_query(&params).unwrap();
        assert_eq!(query.identity, VersionIdentity::GitCommit("ec7b585".to_string()));
        assert_eq!(query.to_api_request().field("git_commit"), Some("ec7b585"));
    }

    #[test]
    fn test_debug_file_request_fields() {
        let request = build_debug_file_request(
            "t",
            "c",
            &Some("1.2.0".to_string()),
            &Some(String::new()),
            Path::new("dsym.zip"),
            &AllReadable,
        )
        .unwrap();
        let keys: Vec<_> = request.form_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["token", "channel_key", "release_version"]);
    }

    #[test]
    fn test_device_upsert_request() {
        let request = device_upsert_request("t", "00008030-001", "QA iPhone", "iPhone 15");
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/api/devices/00008030-001");
        assert_eq!(request.field("model"), Some("iPhone 15"));
    }

    #[test]
    fn test_device_upsert_escapes_udid() {
        let request = device_upsert_request("t", "../apps?id=1#x", "n", "m");
        assert_eq!(request.path, "/api/devices/..%2Fapps%3Fid%3D1%23x");

        let request = device_upsert_request("t", "a b%c", "n", "m");
        assert_eq!(request.path, "/api/devices/a%20b%25c");
    }

    #[tokio::test]
    async fn test_upload_api_request_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.apk");
        std::fs::write(&path, b"apk-bytes").unwrap();

        let params = UploadParams {
            file: path,
            ..upload_params()
        };
        let request = build_upload_request(&params, &crate::collaborators::LocalFiles, &NoCiDetection)
            .unwrap()
            .to_api_request()
            .await
            .unwrap();

        assert_eq!(request.path, UPLOAD_APP_PATH);
        match request.body {
            RequestBody::Multipart { file, .. } => {
                assert_eq!(file.file_name, "app.apk");
                assert_eq!(file.content_type, "application/octet-stream");
                assert_eq!(file.bytes, Bytes::from_static(b"apk-bytes"));
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }
}

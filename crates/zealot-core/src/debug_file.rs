//! Debug-file payload resolution
//!
//! A debug-file upload needs a zip archive. The archive comes from, in
//! priority order: an explicit pre-built file, generation for an explicit
//! platform, or Apple generation when the build context has an active
//! archive. Generation itself is delegated to an [`ArchiveGenerator`].

use crate::collaborators::{ArchiveGenerator, FileProbe};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_ANDROID_BUILD_TYPE: &str = "release";
pub const DEFAULT_OUTPUT_PATH: &str = ".";

/// Platform families a debug-symbol archive can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Mac,
    Android,
}

impl Platform {
    pub const ACCEPTED: [&'static str; 5] = ["ios", "mac", "macos", "osx", "android"];

    pub fn is_apple(&self) -> bool {
        matches!(self, Platform::Ios | Platform::Mac)
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "mac" | "macos" | "osx" => Ok(Platform::Mac),
            "android" => Ok(Platform::Android),
            other => Err(Error::validation(
                "platform",
                format!(
                    "No match value of platform: {}, available values are {}",
                    other,
                    Self::ACCEPTED.join(",")
                ),
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Mac => write!(f, "mac"),
            Platform::Android => write!(f, "android"),
        }
    }
}

/// What the surrounding build left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    /// Xcode archive produced earlier in the same build
    pub active_archive: Option<PathBuf>,
}

/// Caller-supplied parameters for locating or generating the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugFileParams {
    pub zip_file: Option<PathBuf>,
    /// Raw platform name; parsed case-insensitively
    pub platform: Option<String>,
    /// Xcode archive for Apple platforms, project directory for Android
    pub path: Option<PathBuf>,
    pub xcode_scheme: Option<String>,
    pub android_build_type: String,
    pub android_flavor: Option<String>,
    pub extra_files: Vec<String>,
    pub output_path: PathBuf,
    pub overwrite: bool,
}

impl Default for DebugFileParams {
    fn default() -> Self {
        Self {
            zip_file: None,
            platform: None,
            path: None,
            xcode_scheme: None,
            android_build_type: DEFAULT_ANDROID_BUILD_TYPE.to_string(),
            android_flavor: None,
            extra_files: Vec::new(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            overwrite: false,
        }
    }
}

/// Inputs for compressing the dSYM folders of an Xcode archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleArchiveConfig {
    pub archive_path: Option<PathBuf>,
    pub scheme: Option<String>,
    pub extra_files: Vec<String>,
    pub output_path: PathBuf,
    pub overwrite: bool,
}

/// Inputs for compressing the ProGuard mapping of an Android build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidArchiveConfig {
    pub app_path: Option<PathBuf>,
    pub build_type: String,
    pub flavor: Option<String>,
    pub extra_files: Vec<String>,
    pub output_path: PathBuf,
    pub overwrite: bool,
}

/// Archive to generate, tagged by platform family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchivePlan {
    Apple(AppleArchiveConfig),
    Android(AndroidArchiveConfig),
}

impl ArchivePlan {
    fn apple(params: &DebugFileParams, context: &BuildContext) -> Self {
        ArchivePlan::Apple(AppleArchiveConfig {
            archive_path: params
                .path
                .clone()
                .or_else(|| context.active_archive.clone()),
            scheme: params.xcode_scheme.clone(),
            extra_files: params.extra_files.clone(),
            output_path: params.output_path.clone(),
            overwrite: params.overwrite,
        })
    }

    fn android(params: &DebugFileParams) -> Self {
        let build_type = if params.android_build_type.is_empty() {
            DEFAULT_ANDROID_BUILD_TYPE.to_string()
        } else {
            params.android_build_type.clone()
        };

        ArchivePlan::Android(AndroidArchiveConfig {
            app_path: params
                .path
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            build_type,
            flavor: params.android_flavor.clone().filter(|f| !f.is_empty()),
            extra_files: params.extra_files.clone(),
            output_path: params.output_path.clone(),
            overwrite: params.overwrite,
        })
    }
}

/// Pick the archive to generate from the platform or build context
pub fn select_archive_plan(
    params: &DebugFileParams,
    context: &BuildContext,
) -> Result<ArchivePlan> {
    let platform = params
        .platform
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(Platform::from_str)
        .transpose()
        .map_err(|e| Error::Generation {
            message: "unsupported platform".to_string(),
            source: Some(e.into()),
        })?;

    match platform {
        Some(p) if p.is_apple() => Ok(ArchivePlan::apple(params, context)),
        Some(_) => Ok(ArchivePlan::android(params)),
        None if context.active_archive.is_some() => Ok(ArchivePlan::apple(params, context)),
        None => Err(Error::generation("unsupported platform")),
    }
}

/// Dispatch generation to the matching backend
pub fn generate_archive(plan: &ArchivePlan, generator: &dyn ArchiveGenerator) -> Result<PathBuf> {
    match plan {
        ArchivePlan::Apple(config) => generator.generate_dsym_archive(config),
        ArchivePlan::Android(config) => generator.generate_proguard_archive(config),
    }
}

/// Resolve the archive file to upload
pub fn resolve_debug_file_payload(
    params: &DebugFileParams,
    context: &BuildContext,
    files: &dyn FileProbe,
    generator: &dyn ArchiveGenerator,
) -> Result<PathBuf> {
    if let Some(zip_file) = &params.zip_file {
        if files.is_readable(zip_file) {
            debug!(path = %zip_file.display(), "Using pre-built debug file archive");
            return Ok(zip_file.clone());
        }
        warn!(
            "Debug file archive {} is not readable, falling back to generation",
            zip_file.display()
        );
    }

    let plan = select_archive_plan(params, context)?;
    let generated = generate_archive(&plan, generator)?;

    if !files.is_readable(&generated) {
        return Err(Error::generation(format!(
            "Something wrong with compress debug file: {} is not readable",
            generated.display()
        )));
    }

    debug!(path = %generated.display(), "Generated debug file archive");
    Ok(generated)
}

//! Seams to the systems the client depends on but does not implement
//!
//! File probing, CI detection, the remote device directory and debug archive
//! generation are all supplied by the caller through these traits.

use crate::debug_file::{AndroidArchiveConfig, AppleArchiveConfig};
use crate::error::Result;
use crate::types::Device;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Existence and readability check over a path
pub trait FileProbe {
    fn is_readable(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileProbe for LocalFiles {
    fn is_readable(&self, path: &Path) -> bool {
        path.is_file() && File::open(path).is_ok()
    }
}

/// Values inferred from the CI environment running the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiContext {
    pub source: Option<String>,
    pub ci_url: Option<String>,
    pub branch: Option<String>,
    pub git_commit: Option<String>,
}

/// Infers upload metadata from the surrounding CI environment
pub trait CiDetector {
    fn detect(&self) -> Option<CiContext>;
}

/// Closures act as resolver callbacks
impl<F> CiDetector for F
where
    F: Fn() -> Option<CiContext>,
{
    fn detect(&self) -> Option<CiContext> {
        self()
    }
}

/// Detector for callers that already resolved every value
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCiDetection;

impl CiDetector for NoCiDetection {
    fn detect(&self) -> Option<CiContext> {
        None
    }
}

/// Remote device directory listing the devices to reconcile
pub trait DeviceDirectory {
    /// Devices in a stable order
    fn devices(&self) -> Result<Vec<Device>>;
}

/// Produces debug-symbol archives for each supported platform family
pub trait ArchiveGenerator {
    /// Compress the dSYM folders of an Xcode archive
    fn generate_dsym_archive(&self, config: &AppleArchiveConfig) -> Result<PathBuf>;

    /// Compress the ProGuard mapping files of an Android build
    fn generate_proguard_archive(&self, config: &AndroidArchiveConfig) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_local_files_readability() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ipa").unwrap();

        assert!(LocalFiles.is_readable(file.path()));
        assert!(!LocalFiles.is_readable(Path::new("/definitely/not/here.ipa")));

        let dir = tempfile::tempdir().unwrap();
        assert!(!LocalFiles.is_readable(dir.path()));
    }

    #[test]
    fn test_closure_detector() {
        let detector = || {
            Some(CiContext {
                source: Some("jenkins".to_string()),
                ..Default::default()
            })
        };
        assert_eq!(
            detector.detect().and_then(|c| c.source),
            Some("jenkins".to_string())
        );
        assert_eq!(NoCiDetection.detect(), None);
    }
}

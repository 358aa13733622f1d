//! Device directory backed by a JSON file

use serde::Deserialize;
use std::path::{Path, PathBuf};
use zealot_core::{Device, DeviceDirectory, Error, Result};

/// One entry of the device file
#[derive(Debug, Clone, Deserialize)]
struct DeviceEntry {
    udid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    model: String,
    /// Entries without a platform are treated as iOS devices
    #[serde(default)]
    platform: Option<String>,
}

/// Lists the devices of one platform from a JSON array file
#[derive(Debug, Clone)]
pub struct JsonDeviceDirectory {
    path: PathBuf,
    platform: &'static str,
}

impl JsonDeviceDirectory {
    pub fn new(path: impl Into<PathBuf>, platform: &'static str) -> Self {
        Self {
            path: path.into(),
            platform,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeviceDirectory for JsonDeviceDirectory {
    fn devices(&self) -> Result<Vec<Device>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::Io {
            message: format!("Failed to read device file {}", self.path.display()),
            source: e,
        })?;
        let entries: Vec<DeviceEntry> = serde_json::from_str(&content)?;

        Ok(entries
            .into_iter()
            .filter(|entry| matches_platform(entry.platform.as_deref(), self.platform))
            .map(|entry| Device {
                udid: entry.udid,
                name: entry.name,
                model: entry.model,
            })
            .collect())
    }
}

fn matches_platform(entry: Option<&str>, wanted: &str) -> bool {
    let entry = match entry.map(str::to_lowercase) {
        None => return wanted == "ios",
        Some(p) => p,
    };
    match wanted {
        "mac" => matches!(entry.as_str(), "mac" | "macos" | "mac_os" | "osx"),
        other => entry == other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = r#"[
        {"udid": "00008030-AAA", "name": "QA iPhone", "model": "iPhone 15", "platform": "IOS"},
        {"udid": "00008030-BBB", "name": "Legacy", "model": "iPhone X"},
        {"udid": "MAC-CCC", "name": "Build Mac", "model": "Mac mini", "platform": "MAC_OS"}
    ]"#;

    fn directory(platform: &'static str) -> (tempfile::TempDir, JsonDeviceDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        std::fs::write(&path, DEVICES).unwrap();
        (dir, JsonDeviceDirectory::new(path, platform))
    }

    #[test]
    fn test_ios_filter_keeps_order_and_untagged_entries() {
        let (_dir, directory) = directory("ios");
        let devices = directory.devices().unwrap();
        let udids: Vec<&str> = devices.iter().map(|d| d.udid.as_str()).collect();
        assert_eq!(udids, vec!["00008030-AAA", "00008030-BBB"]);
        assert_eq!(devices[0].model, "iPhone 15");
    }

    #[test]
    fn test_mac_filter() {
        let (_dir, directory) = directory("mac");
        let devices = directory.devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Build Mac");
    }

    #[test]
    fn test_missing_file() {
        let directory = JsonDeviceDirectory::new("/no/such/devices.json", "ios");
        assert!(matches!(directory.devices(), Err(Error::Io { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        std::fs::write(&path, r#"{"udid": "not-a-list"}"#).unwrap();
        let directory = JsonDeviceDirectory::new(path, "ios");
        assert!(matches!(directory.devices(), Err(Error::Json { .. })));
    }
}

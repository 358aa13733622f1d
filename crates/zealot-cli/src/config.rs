//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables and command-line arguments, which win

use crate::cli::{ConnectionArgs, OutputFormat};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zealot_core::{Reporter, TransportConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zealot endpoint used when none is passed
    pub endpoint: Option<String>,

    /// Token used when none is passed
    pub token: Option<String>,

    /// Channel key used when none is passed
    pub channel_key: Option<String>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Whether to verify TLS certificates
    pub verify_ssl: Option<bool>,

    /// Escalate service errors to a failing exit status
    pub fail_on_error: Option<bool>,

    /// Output format used when `--output` is not passed
    pub output: Option<OutputFormat>,

    /// Logging settings
    pub logging: LoggingSection,
}

/// Logging section of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

/// Connection inputs after flags, environment and config file are merged
#[derive(Debug, Clone)]
pub struct Connection {
    pub transport: TransportConfig,
    pub token: String,
    pub reporter: Reporter,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".zealot.yaml"), PathBuf::from(".zealot.json")];

        if let Some(config_dir) = dirs::config_dir() {
            let zealot_dir = config_dir.join("zealot");
            paths.push(zealot_dir.join("config.yaml"));
            paths.push(zealot_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("zealot").join("config.yaml"));
        }

        paths
    }

    /// Merge connection flags over the file values
    pub fn connection(&self, args: &ConnectionArgs) -> Result<Connection> {
        let endpoint = args
            .endpoint
            .clone()
            .or_else(|| self.endpoint.clone())
            .ok_or(Error::MissingInput {
                name: "endpoint",
                flag: "endpoint",
                env: "ZEALOT_ENDPOINT",
            })?;

        // Emptiness is checked by the request builders.
        let token = args
            .token
            .clone()
            .or_else(|| self.token.clone())
            .unwrap_or_default();

        let timeout = args.timeout.or(self.timeout).map(Duration::from_secs);
        let verify_ssl = args.verify_ssl.or(self.verify_ssl).unwrap_or(true);
        let fail_on_error = args.fail_on_error.or(self.fail_on_error).unwrap_or(false);

        let transport = TransportConfig::new(&endpoint)?
            .with_verify_ssl(verify_ssl)
            .with_timeout(timeout);

        Ok(Connection {
            transport,
            token,
            reporter: Reporter::new(fail_on_error),
        })
    }

    /// Channel key from the flag, else the config file
    pub fn channel_key(&self, flag: &Option<String>) -> Option<String> {
        flag.clone()
            .filter(|key| !key.is_empty())
            .or_else(|| self.channel_key.clone())
            .filter(|key| !key.is_empty())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zealot.yaml");
        std::fs::write(
            &path,
            "endpoint: https://zealot.example.com\nchannel_key: abc\ntimeout: 30\nlogging:\n  format: json\n",
        )
        .unwrap();

        let config = Config::load_with_file(Some(&path)).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://zealot.example.com"));
        assert_eq!(config.timeout, Some(30));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.output, None);
    }

    #[test]
    fn test_json_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zealot.json");
        std::fs::write(&path, r#"{"verify_ssl": false, "fail_on_error": true, "output": "json-pretty"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.verify_ssl, Some(false));
        assert_eq!(config.fail_on_error, Some(true));
        assert_eq!(config.output, Some(OutputFormat::JsonPretty));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::from_file(Path::new("/no/such/zealot.yaml"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_flags_override_file() {
        let config = Config {
            endpoint: Some("https://file.example.com".to_string()),
            token: Some("file-token".to_string()),
            timeout: Some(10),
            verify_ssl: Some(false),
            ..Default::default()
        };
        let args = ConnectionArgs {
            endpoint: Some("https://flag.example.com".to_string()),
            timeout: Some(60),
            fail_on_error: Some(true),
            ..Default::default()
        };

        let connection = config.connection(&args).unwrap();
        assert_eq!(
            connection.transport.endpoint.as_str(),
            "https://flag.example.com/"
        );
        assert_eq!(connection.transport.timeout, Some(Duration::from_secs(60)));
        assert!(!connection.transport.verify_ssl);
        assert_eq!(connection.token, "file-token");
        assert!(connection.reporter.fail_on_error);
    }

    #[test]
    fn test_channel_key_resolution() {
        let config = Config {
            channel_key: Some("file-key".to_string()),
            ..Default::default()
        };
        assert_eq!(config.channel_key(&Some("flag-key".to_string())).as_deref(), Some("flag-key"));
        assert_eq!(config.channel_key(&Some(String::new())).as_deref(), Some("file-key"));
        assert_eq!(config.channel_key(&None).as_deref(), Some("file-key"));
        assert_eq!(Config::default().channel_key(&None), None);
    }

    #[test]
    fn test_missing_endpoint() {
        let result = Config::default().connection(&ConnectionArgs::default());
        assert!(matches!(result, Err(Error::MissingInput { name: "endpoint", .. })));
    }
}

//! Logging setup for the Zealot CLI
//!
//! This module provides:
//! - Subscriber initialization (compact, full or JSON, console and/or file)
//! - A per-session request id
//! - Redaction of tokens and passwords
//! - Auto-logging operation timers

use crate::config::LoggingSection;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Keeps the file writer flushing until the process exits
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line events
    Compact,
    /// Multi-field events with all details
    Full,
    /// JSON structured events
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: {}", other)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => config.level = "info".to_string(),
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply the config file's logging section
    ///
    /// The file level only applies while no `-v` flag raised the level.
    pub fn merge_with_file(&mut self, section: &LoggingSection, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = &section.level {
                self.level = level.clone();
            }
        }

        if let Some(format) = &section.format {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Warning: {}, using {:?}", e, self.format),
            }
        }

        if let Some(file) = &section.file {
            self.file = Some(file.clone());
        }
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|name| std::env::var(name).ok());
    }

    fn merge_with_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        // RUST_LOG takes precedence
        if let Some(rust_log) = var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = var("ZEALOT_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Warning: {}, using {:?}", e, self.format),
            }
        }

        if let Some(file) = var("ZEALOT_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }

        if let Some(console) = var("ZEALOT_LOG_CONSOLE") {
            self.console = console.eq_ignore_ascii_case("true") || console == "1";
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let (writer, ansi) = make_writer(&config)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Each format yields a distinct subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = generate_request_id();
    REQUEST_ID
        .set(request_id.clone())
        .map_err(|_| Error::other("Request ID already set"))?;

    tracing::debug!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// Route events to the log file when one is set, else to stderr
fn make_writer(config: &LoggingConfig) -> Result<(BoxMakeWriter, bool)> {
    if let Some(path) = &config.file {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::config(format!("Invalid log file path: {}", path.display())))?;

        std::fs::create_dir_all(&directory)?;
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);

        return Ok((BoxMakeWriter::new(non_blocking), false));
    }

    if config.console {
        Ok((
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ))
    } else {
        Ok((BoxMakeWriter::new(std::io::sink), false))
    }
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span carrying the request id and a duration slot
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Masking of credentials in log lines and printed summaries
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    const MASK: &str = "***";

    fn token_pattern() -> Option<&'static Regex> {
        static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
        TOKEN_REGEX
            .get_or_init(|| {
                Regex::new(r#"(?i)\b(token|bearer)([=:\s]+)['"]?[a-zA-Z0-9_.-]{4,}['"]?"#).ok()
            })
            .as_ref()
    }

    fn password_pattern() -> Option<&'static Regex> {
        static PASSWORD_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
        PASSWORD_REGEX
            .get_or_init(|| {
                Regex::new(r#"(?i)\b(password|passwd|pwd)([=:\s]+)['"]?[^\s'"&]{1,}['"]?"#).ok()
            })
            .as_ref()
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();

        for regex in [token_pattern(), password_pattern()].into_iter().flatten() {
            result = regex.replace_all(&result, format!("$1$2{}", MASK)).to_string();
        }

        result
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) {
                        *val = serde_json::Value::String(MASK.to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            serde_json::Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    /// Keys whose values never reach the console or the log
    pub fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_lowercase();
        key.contains("token")
            || key.contains("password")
            || key.contains("passwd")
            || key.contains("secret")
            || key.contains("authorization")
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::{Duration, Instant};
    use tracing::Span;

    /// A timer that logs its duration when finished or dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
        finished: bool,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self::start(operation, super::create_operation_span(operation, None))
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self::start(
                operation,
                super::create_operation_span(operation, Some(details)),
            )
        }

        fn start(operation: &str, span: Span) -> Self {
            Self {
                start: Instant::now(),
                span,
                operation: operation.to_string(),
                finished: false,
            }
        }

        /// Finish the timer and log the duration
        pub fn finish(mut self) {
            let duration = self.record();
            self.finished = true;
            tracing::info!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }

        fn record(&self) -> Duration {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);
            duration
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            if self.finished {
                return;
            }
            let duration = self.record();
            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed (auto-timed)"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_redaction() {
        let input = "token=t0k3n-abcdef password=hunter2 channel_key=abc";
        let redacted = redaction::redact_sensitive(input);
        assert!(redacted.contains("token=***"));
        assert!(redacted.contains("password=***"));
        assert!(redacted.contains("channel_key=abc"));
        assert!(!redacted.contains("t0k3n-abcdef"));
        assert!(!redacted.contains("hunter2"));
    }

    #[test]
    fn test_json_redaction() {
        let mut value = serde_json::json!({
            "token": "t0k3n",
            "channel_key": "ch4nn3l",
            "optional": {
                "password": "hunter2",
                "changelog": "fixed bugs"
            }
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["token"], "***");
        assert_eq!(value["channel_key"], "ch4nn3l");
        assert_eq!(value["optional"]["password"], "***");
        assert_eq!(value["optional"]["changelog"], "fixed bugs");
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(1);
        assert_eq!(config.level, "info");

        let config = LoggingConfig::from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RUST_LOG", "zealot_core=debug"),
            ("ZEALOT_LOG_FORMAT", "JSON"),
            ("ZEALOT_LOG_FILE", "/tmp/zealot.log"),
            ("ZEALOT_LOG_CONSOLE", "0"),
        ]
        .into_iter()
        .collect();

        let mut config = LoggingConfig::default();
        config.merge_with_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.level, "zealot_core=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/zealot.log")));
        assert!(!config.console);
    }

    #[test]
    fn test_file_section_respects_verbosity() {
        let section = LoggingSection {
            level: Some("error".to_string()),
            format: Some("full".to_string()),
            file: None,
        };

        let mut quiet = LoggingConfig::from_verbosity(0);
        quiet.merge_with_file(&section, 0);
        assert_eq!(quiet.level, "error");
        assert_eq!(quiet.format, LogFormat::Full);

        let mut verbose = LoggingConfig::from_verbosity(2);
        verbose.merge_with_file(&section, 2);
        assert_eq!(verbose.level, "debug");
    }

    #[test]
    fn test_request_id_shape() {
        let id = generate_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 4 + 32);
    }
}

//! Error types and handling for the CLI
//!
//! Every failure mode maps to its own process exit status so CI scripts can
//! tell a rejected upload from a bad flag.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from zealot-core
    #[error("{0}")]
    Core(#[from] zealot_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input was not supplied by flag, environment or config file
    #[error("Missing required value '{}'. Pass --{} or set {}", name, flag, env)]
    MissingInput {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core {
                zealot_core::Error::Validation { .. } => 20,
                zealot_core::Error::Generation { .. } => 21,
                zealot_core::Error::Transport { .. } => 22,
                zealot_core::Error::Service { .. } => 23,
                zealot_core::Error::Fatal { .. } => 24,
                zealot_core::Error::Configuration { .. } => 25,
                zealot_core::Error::Json { .. } => 26,
                zealot_core::Error::Io { .. } => 27,
            },
            Self::FileNotFound { .. } => 3,
            Self::Config(_) => 5,
            Self::MissingInput { .. } => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::Core(zealot_core::Error::Validation { .. })
        )
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_core_variant() {
        let validation: Error = zealot_core::Error::validation("token", "missing").into();
        let fatal: Error = zealot_core::Error::Fatal {
            message: "Error uploading to Zealot [500]: boom".to_string(),
        }
        .into();

        assert_eq!(validation.exit_code(), 20);
        assert_eq!(fatal.exit_code(), 24);
        assert!(validation.should_show_help());
        assert!(!fatal.should_show_help());
    }

    #[test]
    fn test_missing_input_message() {
        let err = Error::MissingInput {
            name: "endpoint",
            flag: "endpoint",
            env: "ZEALOT_ENDPOINT",
        };
        assert_eq!(
            err.to_string(),
            "Missing required value 'endpoint'. Pass --endpoint or set ZEALOT_ENDPOINT"
        );
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::other("boom");
        assert_eq!(format_error(&err, false), "Error: boom");
    }
}

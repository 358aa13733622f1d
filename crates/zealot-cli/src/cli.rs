//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API. Every
//! connection input can also come from a `ZEALOT_*` environment variable or
//! the config file.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Zealot CLI - Upload builds and debug files to a Zealot server
///
/// Uploads app packages, checks whether a build already exists, uploads
/// dSYM or ProGuard archives and syncs registered devices.
#[derive(Parser, Debug)]
#[command(
    name = "zealot",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ZEALOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an app package to a channel
    Upload(UploadArgs),

    /// Check whether a build version already exists
    VersionCheck(VersionCheckArgs),

    /// Upload a dSYM or ProGuard archive
    DebugFile(DebugFileArgs),

    /// Sync devices from a device directory file
    SyncDevices(SyncDevicesArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Connection settings shared by every service command
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// The endpoint of Zealot
    #[arg(long, env = "ZEALOT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// The token of user
    #[arg(long, env = "ZEALOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "ZEALOT_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Whether to verify TLS certificates
    #[arg(
        long,
        env = "ZEALOT_VERIFY_SSL",
        value_name = "BOOL",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub verify_ssl: Option<bool>,

    /// Stop with a non-zero exit status when the service reports an error
    #[arg(
        long,
        env = "ZEALOT_FAIL_ON_ERROR",
        value_name = "BOOL",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub fail_on_error: Option<bool>,
}

/// Arguments for the upload command
#[derive(Parser, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// The key of app's channel
    #[arg(long, env = "ZEALOT_CHANNEL_KEY")]
    pub channel_key: Option<String>,

    /// The path of app file (ipa or apk) [default: last *.ipa, else last *.apk in the working directory]
    #[arg(long, env = "ZEALOT_FILE", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// The name of app
    #[arg(long, env = "ZEALOT_NAME")]
    pub name: Option<String>,

    /// The changelog of app
    #[arg(long, env = "ZEALOT_CHANGELOG")]
    pub changelog: Option<String>,

    /// The slug of app
    #[arg(long, env = "ZEALOT_SLUG")]
    pub slug: Option<String>,

    /// The release type of app
    #[arg(long, env = "ZEALOT_RELEASE_TYPE")]
    pub release_type: Option<String>,

    /// The name of git branch
    #[arg(long, env = "ZEALOT_BRANCH")]
    pub branch: Option<String>,

    /// The hash of git commit
    #[arg(long, env = "ZEALOT_GIT_COMMIT")]
    pub git_commit: Option<String>,

    /// Custom fields as a JSON object or array
    #[arg(long, env = "ZEALOT_CUSTOM_FIELDS", value_name = "JSON", value_parser = parse_json)]
    pub custom_fields: Option<serde_json::Value>,

    /// The password of app to download
    #[arg(long, env = "ZEALOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The name of upload source
    #[arg(long, env = "ZEALOT_SOURCE")]
    pub source: Option<String>,

    /// The url of ci build
    #[arg(long, env = "ZEALOT_CI_URL")]
    pub ci_url: Option<String>,
}

/// Arguments for the version-check command
#[derive(Parser, Debug)]
pub struct VersionCheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// The key of app's channel
    #[arg(long, env = "ZEALOT_CHANNEL_KEY")]
    pub channel_key: Option<String>,

    /// The bundle id (package name) of app
    #[arg(long, env = "ZEALOT_BUNDLE_ID")]
    pub bundle_id: Option<String>,

    /// The release version of app
    #[arg(long, env = "ZEALOT_RELEASE_VERSION")]
    pub release_version: Option<String>,

    /// The build version of app
    #[arg(long, env = "ZEALOT_BUILD_VERSION")]
    pub build_version: Option<String>,

    /// The hash of git commit
    #[arg(long, env = "ZEALOT_GIT_COMMIT")]
    pub git_commit: Option<String>,
}

/// Arguments for the debug-file command
#[derive(Parser, Debug)]
pub struct DebugFileArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// The key of app's channel
    #[arg(long, env = "ZEALOT_CHANNEL_KEY")]
    pub channel_key: Option<String>,

    /// A pre-built zip archive to upload as-is
    #[arg(long, env = "ZEALOT_ZIP_FILE", value_name = "FILE")]
    pub zip_file: Option<PathBuf>,

    /// The name of platform (ios, mac, macos, osx, android)
    #[arg(long, env = "ZEALOT_PLATFORM")]
    pub platform: Option<String>,

    /// Xcode archive path for Apple platforms, project path for Android
    #[arg(long, env = "ZEALOT_PATH")]
    pub path: Option<PathBuf>,

    /// Xcode archive produced earlier in the build
    #[arg(long, env = "XCODEBUILD_ARCHIVE", value_name = "PATH")]
    pub xcode_archive: Option<PathBuf>,

    /// The scheme name of app
    #[arg(long, env = "ZEALOT_XCODE_SCHEME")]
    pub xcode_scheme: Option<String>,

    /// The build type of app
    #[arg(long, env = "ZEALOT_ANDROID_BUILD_TYPE", default_value = "release")]
    pub android_build_type: String,

    /// The product flavor of app
    #[arg(long, env = "ZEALOT_ANDROID_FLAVOR")]
    pub android_flavor: Option<String>,

    /// Extra file names to include in the archive
    #[arg(long = "extra-file", env = "ZEALOT_EXTRA_FILES", value_delimiter = ',')]
    pub extra_files: Vec<String>,

    /// The output path of the compressed archive
    #[arg(long, env = "DF_DSYM_OUTPUT_PATH", default_value = ".")]
    pub output_path: PathBuf,

    /// Overwrite an existing archive at the output path
    #[arg(long, env = "DF_DSYM_OVERWRITE")]
    pub overwrite: bool,

    /// External command that packages the archive and prints its path
    #[arg(long, env = "ZEALOT_ARCHIVE_COMMAND", value_name = "COMMAND")]
    pub archive_command: Option<String>,

    /// The release version of app
    #[arg(long, env = "ZEALOT_RELEASE_VERSION")]
    pub release_version: Option<String>,

    /// The build version of app
    #[arg(long, env = "ZEALOT_BUILD_VERSION")]
    pub build_version: Option<String>,
}

/// Arguments for the sync-devices command
#[derive(Parser, Debug)]
pub struct SyncDevicesArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// JSON file listing devices as `{udid, name, model, platform?}`
    #[arg(long, env = "ZEALOT_DEVICES_FILE", value_name = "FILE")]
    pub devices: PathBuf,

    /// Which Apple device platform to sync
    #[arg(long, value_enum, env = "ZEALOT_APPLE_PLATFORM", default_value = "ios")]
    pub platform: DevicePlatform,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Device platforms accepted by the device directory filter
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DevicePlatform {
    Ios,
    Mac,
}

impl DevicePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePlatform::Ios => "ios",
            DevicePlatform::Mac => "mac",
        }
    }
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

fn parse_json(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid JSON: {}", e))
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

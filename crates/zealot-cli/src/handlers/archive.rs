//! Debug archive generation through an external packaging command
//!
//! The command runs through the platform shell with the archive settings
//! exported as environment variables. Its last non-empty stdout line is the
//! path of the produced archive.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};
use zealot_core::{AndroidArchiveConfig, AppleArchiveConfig, ArchiveGenerator, Error, Result};

/// [`ArchiveGenerator`] that shells out to a user supplied command
#[derive(Debug, Clone, Default)]
pub struct CommandArchiveGenerator {
    command: Option<String>,
}

impl CommandArchiveGenerator {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }

    fn run(&self, kind: &str, vars: Vec<(&'static str, String)>) -> Result<PathBuf> {
        let command = self.command.as_deref().ok_or_else(|| {
            Error::generation(format!(
                "no {} archive generator configured, pass --zip-file or --archive-command",
                kind
            ))
        })?;

        info!(kind, "Generating debug file archive");
        debug!(command, "Running archive command");

        let output = shell(command)
            .envs(vars)
            .output()
            .map_err(|e| Error::Generation {
                message: format!("failed to run archive command `{}`", command),
                source: Some(e.into()),
            })?;

        archive_path(&output)
    }
}

impl ArchiveGenerator for CommandArchiveGenerator {
    fn generate_dsym_archive(&self, config: &AppleArchiveConfig) -> Result<PathBuf> {
        let mut vars = vec![("ZEALOT_DEBUG_FILE_PLATFORM", "apple".to_string())];
        if let Some(archive) = &config.archive_path {
            vars.push(("ZEALOT_ARCHIVE_PATH", path_string(archive)));
        }
        if let Some(scheme) = &config.scheme {
            vars.push(("ZEALOT_XCODE_SCHEME", scheme.clone()));
        }
        vars.extend(common_vars(&config.extra_files, &config.output_path, config.overwrite));

        self.run("dSYM", vars)
    }

    fn generate_proguard_archive(&self, config: &AndroidArchiveConfig) -> Result<PathBuf> {
        let mut vars = vec![
            ("ZEALOT_DEBUG_FILE_PLATFORM", "android".to_string()),
            ("ZEALOT_ANDROID_BUILD_TYPE", config.build_type.clone()),
        ];
        if let Some(app_path) = &config.app_path {
            vars.push(("ZEALOT_APP_PATH", path_string(app_path)));
        }
        if let Some(flavor) = &config.flavor {
            vars.push(("ZEALOT_ANDROID_FLAVOR", flavor.clone()));
        }
        vars.extend(common_vars(&config.extra_files, &config.output_path, config.overwrite));

        self.run("ProGuard", vars)
    }
}

fn common_vars(
    extra_files: &[String],
    output_path: &Path,
    overwrite: bool,
) -> Vec<(&'static str, String)> {
    vec![
        ("ZEALOT_EXTRA_FILES", extra_files.join(",")),
        ("ZEALOT_OUTPUT_PATH", path_string(output_path)),
        ("ZEALOT_OVERWRITE", overwrite.to_string()),
    ]
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn archive_path(output: &Output) -> Result<PathBuf> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::generation(format!(
            "archive command exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(PathBuf::from)
        .ok_or_else(|| Error::generation("archive command printed no archive path"))
}

//! Upload command handler

use super::ci::EnvCiDetector;
use super::{print_last_error, summary_title, CommandReport};
use crate::cli::UploadArgs;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use zealot_core::{
    build_upload_request, CiContext, CiDetector, InvocationContext, LocalFiles, Operation,
    UploadParams, UploadRequest, ZealotClient,
};

/// Upload source reported when neither the caller nor the CI environment names one
pub const DEFAULT_SOURCE: &str = "zealot-cli";

/// Handle the upload command
#[instrument(skip_all, fields(file = ?args.file))]
pub async fn handle_upload(
    args: UploadArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    // An empty path is rejected by the request builder
    let file = args
        .file
        .or_else(|| discover_app_file(Path::new(".")))
        .unwrap_or_default();
    let timer = Timer::with_details("upload", &file.display().to_string());
    let Connection {
        transport,
        token,
        reporter,
    } = config.connection(&args.connection)?;
    let mut context = InvocationContext::new();

    let params = UploadParams {
        token,
        channel_key: config.channel_key(&args.channel_key).unwrap_or_default(),
        file,
        name: args.name,
        changelog: args.changelog,
        release_type: args.release_type,
        slug: args.slug,
        branch: args.branch,
        source: args.source,
        git_commit: args.git_commit,
        password: args.password,
        custom_fields: args.custom_fields,
        ci_url: args.ci_url,
    };
    let ci = || with_default_source(&EnvCiDetector);
    let request = build_upload_request(&params, &LocalFiles, &ci)
        .map_err(|e| reporter.abort(e, &mut context))?;

    output.summary(&summary_title("zealot"), &summary_rows(&request))?;
    output.success(&format!("Uploading to {} ...", transport.endpoint))?;

    let client = ZealotClient::connect(transport)?;
    let spinner = output.spinner("Uploading build...");
    let result = client.upload_app(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result.map_err(|e| reporter.abort(e, &mut context))?;
    let outcome = reporter.report(Operation::UploadApp, outcome, &mut context)?;

    if outcome.app_release().is_some() {
        output.success("Build successfully uploaded to Zealot.")?;
        output.success(&format!("Release URL: {}", display(&context.release_url)))?;
        output.success(&format!("QRCode URL: {}", display(&context.qrcode_url)))?;
        output.success(&format!("Download URL: {}", display(&context.install_url)))?;
        info!(release_id = ?context.release_id, "Build uploaded");
    } else {
        print_last_error(&context, output)?;
    }

    output.data(&CommandReport::outcome("upload", &outcome, &context))?;
    timer.finish();
    Ok(())
}

/// Rows of the pre-upload summary; the file shows as its path
fn summary_rows(request: &UploadRequest) -> Vec<(String, String)> {
    let mut rows = vec![
        ("token".to_string(), request.token.clone()),
        ("channel_key".to_string(), request.channel_key.clone()),
        (
            "file".to_string(),
            request.file.path.display().to_string(),
        ),
    ];
    rows.extend(
        request
            .optional
            .present_fields()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value)),
    );
    rows
}

/// Last `*.ipa` in `dir` by name, else the last `*.apk`
fn discover_app_file(dir: &Path) -> Option<PathBuf> {
    let files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();

    let found = ["ipa", "apk"].into_iter().find_map(|extension| {
        files
            .iter()
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
            .max()
            .cloned()
    });
    if let Some(path) = &found {
        info!(file = %path.display(), "Using app file found in {}", dir.display());
    }
    found
}

/// CI detection that always names an upload source
fn with_default_source(ci: &dyn CiDetector) -> Option<CiContext> {
    let mut context = ci.detect().unwrap_or_default();
    if context.source.as_deref().map_or(true, str::is_empty) {
        context.source = Some(DEFAULT_SOURCE.to_string());
    }
    Some(context)
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

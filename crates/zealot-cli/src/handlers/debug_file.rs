//! Debug file command handler

use super::archive::CommandArchiveGenerator;
use super::{print_last_error, summary_title, CommandReport};
use crate::cli::DebugFileArgs;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde_json::Value;
use tracing::instrument;
use zealot_core::{
    build_debug_file_request, resolve_debug_file_payload, BuildContext, DebugFileParams,
    DebugFileReceipt, InvocationContext, LocalFiles, Operation, ZealotClient,
};

/// Handle the debug-file command
#[instrument(skip_all, fields(platform = ?args.platform))]
pub async fn handle_debug_file(
    args: DebugFileArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::new("debug_file");
    let Connection {
        transport,
        token,
        reporter,
    } = config.connection(&args.connection)?;
    let mut context = InvocationContext::new();

    let params = DebugFileParams {
        zip_file: args.zip_file,
        platform: args.platform,
        path: args.path,
        xcode_scheme: args.xcode_scheme,
        android_build_type: args.android_build_type,
        android_flavor: args.android_flavor,
        extra_files: args.extra_files,
        output_path: args.output_path,
        overwrite: args.overwrite,
    };
    let build = BuildContext {
        active_archive: args.xcode_archive,
    };
    let generator = CommandArchiveGenerator::new(args.archive_command);

    let archive = resolve_debug_file_payload(&params, &build, &LocalFiles, &generator)
        .map_err(|e| reporter.abort(e, &mut context))?;
    let request = build_debug_file_request(
        &token,
        &config.channel_key(&args.channel_key).unwrap_or_default(),
        &args.release_version,
        &args.build_version,
        &archive,
        &LocalFiles,
    )
    .map_err(|e| reporter.abort(e, &mut context))?;

    let mut rows = request.form_fields();
    rows.push(("file".to_string(), archive.display().to_string()));
    output.summary(&summary_title("zealot_debug_file"), &rows)?;
    output.success(&format!("Uploading to {} ...", transport.endpoint))?;

    let client = ZealotClient::connect(transport)?;
    let spinner = output.spinner("Uploading debug file...");
    let result = client.upload_debug_file(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result.map_err(|e| reporter.abort(e, &mut context))?;
    let outcome = reporter.report(Operation::UploadDebugFile, outcome, &mut context)?;

    match outcome.debug_file_receipt() {
        Some(receipt) => {
            output.success("Debug file successfully uploaded to Zealot.")?;
            if !receipt.metadata.is_empty() {
                output.table(&["Key", "Value"], metadata_rows(receipt))?;
            }
        }
        None => print_last_error(&context, output)?,
    }

    output.data(&CommandReport::outcome("debug-file", &outcome, &context))?;
    timer.finish();
    Ok(())
}

/// Flatten per-architecture metadata into key/value rows
fn metadata_rows(receipt: &DebugFileReceipt) -> Vec<Vec<String>> {
    receipt
        .metadata
        .iter()
        .flat_map(|entry| entry.iter())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vec![key.clone(), value]
        })
        .collect()
}

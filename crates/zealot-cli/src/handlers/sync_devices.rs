//! Device sync command handler

use super::devices::JsonDeviceDirectory;
use super::{summary_title, CommandReport};
use crate::cli::SyncDevicesArgs;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::instrument;
use zealot_core::{sync_devices, InvocationContext, ZealotClient};

/// Handle the sync-devices command
#[instrument(skip_all, fields(platform = args.platform.as_str()))]
pub async fn handle_sync_devices(
    args: SyncDevicesArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("sync_devices", args.platform.as_str());
    let Connection {
        transport,
        token,
        reporter,
    } = config.connection(&args.connection)?;
    let mut context = InvocationContext::new();
    let directory = JsonDeviceDirectory::new(&args.devices, args.platform.as_str());

    output.summary(
        &summary_title("zealot_sync_devices"),
        &[
            ("token".to_string(), token.clone()),
            ("devices".to_string(), directory.path().display().to_string()),
            ("platform".to_string(), args.platform.as_str().to_string()),
        ],
    )?;
    output.success(&format!("Syncing devices to {} ...", transport.endpoint))?;

    let client = ZealotClient::connect(transport)?;
    let spinner = output.spinner("Syncing devices...");
    let result = sync_devices(&directory, &client, &token).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let sync = result.map_err(|e| reporter.abort(e, &mut context))?;

    output.info(&format!("Registered devices: {}", sync.devices.len()))?;
    output.table(
        &["UDID", "Name", "Model"],
        sync.devices
            .iter()
            .map(|d| vec![d.udid.clone(), d.name.clone(), d.model.clone()])
            .collect(),
    )?;

    let summary = reporter.report_sync(&sync.outcome);
    if summary.failure_count > 0 {
        context.last_error = Some(format!(
            "Error syncing devices to Zealot: {} of {} devices failed",
            summary.failure_count,
            sync.devices.len()
        ));
    }

    output.sync_summary(&summary)?;
    output.data(&CommandReport::sync("sync-devices", &summary, &context))?;
    timer.finish();
    Ok(())
}

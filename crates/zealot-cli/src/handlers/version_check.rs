//! Version check command handler

use super::ci::EnvCiDetector;
use super::{print_last_error, summary_title, CommandReport};
use crate::cli::VersionCheckArgs;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::instrument;
use zealot_core::{
    build_version_check_query, CiDetector, InvocationContext, Operation, Outcome,
    VersionCheckParams, ZealotClient,
};

/// Handle the version-check command
#[instrument(skip_all)]
pub async fn handle_version_check(
    args: VersionCheckArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::new("version_check");
    let Connection {
        transport,
        token,
        reporter,
    } = config.connection(&args.connection)?;
    let mut context = InvocationContext::new();

    let git_commit = args
        .git_commit
        .filter(|c| !c.is_empty())
        .or_else(|| EnvCiDetector.detect().and_then(|ci| ci.git_commit));

    let params = VersionCheckParams {
        token,
        channel_key: config.channel_key(&args.channel_key).unwrap_or_default(),
        bundle_id: args.bundle_id.unwrap_or_default(),
        release_version: args.release_version,
        build_version: args.build_version,
        git_commit,
    };
    let query = build_version_check_query(&params).map_err(|e| reporter.abort(e, &mut context))?;

    output.summary(&summary_title("zealot_version_check"), &query.query_pairs())?;
    output.success("Checking app version from Zealot ...")?;

    let client = ZealotClient::connect(transport)?;
    let outcome = client.check_version(&query).await;
    let outcome = reporter.report(Operation::CheckVersion, outcome, &mut context)?;

    match &outcome {
        found if found.already_exists() => {
            output.warning("Found app version, you can skip upload it")?
        }
        Outcome::NotFound => output.success("Not found app version, you can upload it")?,
        _ => print_last_error(&context, output)?,
    }

    output.data(&CommandReport::outcome("version-check", &outcome, &context))?;
    timer.finish();
    Ok(())
}

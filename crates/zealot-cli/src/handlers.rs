//! Command handlers for CLI subcommands
//!
//! Each handler resolves its inputs against the loaded [`Config`], drives one
//! `zealot_core` operation and renders the result through the
//! [`OutputWriter`].

mod archive;
mod ci;
mod completions;
mod debug_file;
mod devices;
mod sync_devices;
mod upload;
mod version_check;

pub use completions::handle_completions;
pub use debug_file::handle_debug_file;
pub use sync_devices::handle_sync_devices;
pub use upload::handle_upload;
pub use version_check::handle_version_check;

use crate::output::OutputWriter;
use crate::error::Result;
use serde::Serialize;
use zealot_core::{InvocationContext, Outcome, SyncSummary};

/// Structured result written for the machine output formats
#[derive(Debug, Serialize)]
struct CommandReport<'a> {
    command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<&'a SyncSummary>,
    context: &'a InvocationContext,
}

impl<'a> CommandReport<'a> {
    fn outcome(command: &'static str, outcome: &'a Outcome, context: &'a InvocationContext) -> Self {
        Self {
            command,
            outcome: Some(outcome),
            sync: None,
            context,
        }
    }

    fn sync(command: &'static str, summary: &'a SyncSummary, context: &'a InvocationContext) -> Self {
        Self {
            command,
            outcome: None,
            sync: Some(summary),
            context,
        }
    }
}

/// Print the failure a non-fatal outcome left in the context
fn print_last_error(context: &InvocationContext, output: &mut OutputWriter) -> Result<()> {
    if let Some(message) = &context.last_error {
        output.error(message)?;
    }
    Ok(())
}

/// Title of the summary table printed before each request
fn summary_title(command: &str) -> String {
    format!("Summary for {} {}", command, env!("CARGO_PKG_VERSION"))
}

//! Zealot CLI - Command-line interface for the Zealot release-management service
//!
//! This is the main entry point for the `zealot` binary, providing commands
//! for uploading builds and debug files, checking app versions and syncing
//! devices.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // The config file may carry a logging section, so it loads first
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => process::exit(0),
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &error::Error) -> ! {
    eprintln!(
        "{}",
        error::format_error(e, control::SHOULD_COLORIZE.should_colorize())
    );

    if e.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(e.exit_code());
}

/// Main application logic
#[instrument(skip_all)]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli.output.or(config.output).unwrap_or_default();
    let mut output = OutputWriter::new(format, cli.use_color(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    match cli.command {
        Commands::Upload(args) => handlers::handle_upload(args, &config, &mut output).await,
        Commands::VersionCheck(args) => {
            handlers::handle_version_check(args, &config, &mut output).await
        }
        Commands::DebugFile(args) => handlers::handle_debug_file(args, &config, &mut output).await,
        Commands::SyncDevices(args) => {
            handlers::handle_sync_devices(args, &config, &mut output).await
        }
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);

    logging_config.merge_with_file(&config.logging, verbosity);
    logging_config.merge_with_env();

    // Quiet mode only logs errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["zealot", "completions", "bash"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["zealot", "-vv", "completions", "zsh"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["zealot", "--quiet", "completions", "fish"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert!(cli.quiet);
    }
}

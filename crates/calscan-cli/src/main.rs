//! calscan CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use calscan_cli::cli::{Cli, Command, ConfigAction};
use calscan_cli::commands;
use calscan_cli::config::AppConfig;
use calscan_cli::error::AppResult;
use calscan_core::{TracingConfig, init_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config_path = cli.config.as_deref();
    let command = cli.command.unwrap_or(Command::Run);

    if matches!(
        command,
        Command::Config {
            action: ConfigAction::Path
        }
    ) {
        return commands::config::path(config_path);
    }

    let config = AppConfig::load(config_path)?;

    // The scan logs to its file; interactive commands log to stderr.
    let mut tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default().with_level(config.log_level()?)
    };
    if matches!(command, Command::Run) {
        tracing_config = tracing_config.with_log_file(config.log_file());
    }
    init_tracing(tracing_config)?;

    match command {
        Command::Run => commands::run::run(&config).await.map(|_| ()),
        Command::Auth { force } => commands::auth::auth(&config, force).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(config_path),
        },
    }
}

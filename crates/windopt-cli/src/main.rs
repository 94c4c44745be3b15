use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

use windopt_cli::cli::{Cli, Commands};
use windopt_cli::config::{load_settings, WindoptSettings};

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A broken settings file must not stop `config init --force` from repairing it.
    let (settings, settings_error) = match load_settings() {
        Ok(settings) => (settings, None),
        Err(err) => (WindoptSettings::default(), Some(err)),
    };
    let level = cli
        .log_level
        .or_else(|| settings.log_level().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }
    if let Some(err) = settings_error {
        error!("ignoring settings file: {err:#}");
    }
    debug!(?level, "starting windopt");

    match run(&cli, &settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

/// Dispatch the subcommand; `Ok(false)` means it ran but found problems.
fn run(cli: &Cli, settings: &WindoptSettings) -> anyhow::Result<bool> {
    let library = cli.library.as_deref();
    match &cli.command {
        Commands::Validate {
            config,
            registry,
            format,
        } => commands::validate::handle(
            config,
            registry.as_deref(),
            format.unwrap_or(settings.output.format),
            library,
            settings,
        ),
        Commands::Show {
            config,
            component,
            format,
        } => commands::show::handle(
            config,
            component.as_deref(),
            format.unwrap_or(settings.output.format),
            library,
            settings,
        )
        .map(|_| true),
        Commands::Normalize { config, out } => {
            commands::normalize::handle(config, out.as_deref(), library, settings).map(|_| true)
        }
        Commands::Library { command } => {
            commands::library::handle(command, library, settings).map(|_| true)
        }
        Commands::Config { command } => commands::config::handle(command).map(|_| true),
        Commands::Completions { shell, out } => {
            commands::completions::handle(*shell, out.as_deref()).map(|_| true)
        }
    }
}

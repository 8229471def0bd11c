//! ecfjob - ecFlow job lifecycle wrapper
//!
//! Main entry point for the ecfjob CLI.

mod cli;
mod cmd_admin;
mod cmd_run;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ecfjob_config::{
    default_config_path, Config, ConfigError, ConfigLoader, ConfigValidator, LoggingConfig,
    ValidationWarning,
};

use crate::cli::{Cli, Commands};

/// Loaded configuration plus the validator's warnings, which are logged once
/// tracing is up.
pub(crate) struct Settings {
    pub config: Config,
    pub warnings: Vec<ValidationWarning>,
}

fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match path {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_or_default(&default_config_path())?,
    };

    let report = ConfigValidator::validate(&config);
    if !report.is_valid() {
        let errors: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        return Err(ConfigError::InvalidFormat(errors.join("; ")));
    }

    Ok(Settings {
        config,
        warnings: report.warnings,
    })
}

/// Install the global subscriber: console on stderr, plus a daily rolling
/// file when a log directory is configured.
pub(crate) fn init_tracing(
    logging: &LoggingConfig,
    warnings: &[ValidationWarning],
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("ecfjob")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The worker flushes on drop, so the guard lives until exit.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            if logging.json {
                Some(layer.json().boxed())
            } else {
                Some(layer.boxed())
            }
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(logging.ansi),
        )
        .with(file_layer)
        .try_init()?;

    for warning in warnings {
        warn!("Config: {}: {}", warning.path, warning.message);
    }

    Ok(())
}

/// Map a failure status onto a process exit code.
pub(crate) fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run(args) => cmd_run::handle_run(args, settings),
        Commands::Admin(args) => cmd_admin::handle_admin(args, settings),
    }
}

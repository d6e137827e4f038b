use anyhow::{Context, Result};
use clap::Parser;
use copydiff::config::{Cli, DEFAULT_LOG_FILE};
use copydiff::Config;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::try_from(&cli) {
        Ok(config) => config,
        Err(err) => {
            // No config was read, so the log file comes from the CLI alone
            let log_file = fallback_log_file(&cli);
            let _guard = init_logging(cli.log_level.as_deref(), log_file.as_deref())?;
            error!("cannot load configuration {}: {}", cli.config.display(), err);
            return Err(err).with_context(|| {
                format!("failed to load configuration from {}", cli.config.display())
            });
        }
    };

    // Dropping the guard flushes the log file, keep it for the whole run
    let _guard = init_logging(cli.log_level.as_deref(), config.log_file.as_deref())?;

    info!("copydiff v{}", copydiff::VERSION);
    info!("Config file : {}", cli.config.display());
    info!("Source      : {}", config.source.display());
    info!("Destination : {}", config.destination.display());

    match copydiff::commands::sync::run(config) {
        Ok(outcome) => {
            if !outcome.is_complete() {
                warn!(
                    failed = outcome.failed(),
                    "some files could not be copied, see the log for details"
                );
            }
            Ok(())
        }
        Err(err) => {
            error!("run aborted: {}", err);
            Err(err).context("copy run failed")
        }
    }
}

/// Log file to use before a config file could be read
fn fallback_log_file(cli: &Cli) -> Option<PathBuf> {
    if cli.no_log_file {
        None
    } else {
        Some(
            cli.log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        )
    }
}

fn init_logging(level: Option<&str>, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let terminal_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy().into_owned())
                .build(dir)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(terminal_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

//! Command-line arguments

use super::{Config, FailurePolicy, SyncMode};
use crate::types::SyncError;
use clap::Parser;
use std::path::PathBuf;

/// Copy files missing from a destination tree, renaming instead of overwriting.
#[derive(Parser, Debug, Clone)]
#[command(name = "copydiff", version, about)]
pub struct Cli {
    /// Path to the configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the layout mode from the config file
    #[arg(long, value_enum)]
    pub mode: Option<SyncMode>,

    /// Abort on the first error
    #[arg(long, conflicts_with = "permissive")]
    pub strict: bool,

    /// Log per-file errors and continue
    #[arg(long)]
    pub permissive: bool,

    /// Show what would be copied without touching the destination
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Log level filter (trace, debug, info, warn, error); RUST_LOG wins
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write the persistent log here instead of the configured file
    #[arg(long, conflicts_with = "no_log_file")]
    pub log_file: Option<PathBuf>,

    /// Only log to the terminal
    #[arg(long)]
    pub no_log_file: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

impl TryFrom<&Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let mut config = Config::load_from_file(&cli.config)?;

        if let Some(mode) = cli.mode {
            config.mode = mode;
        }
        if cli.strict {
            config.policy = FailurePolicy::Strict;
        } else if cli.permissive {
            config.policy = FailurePolicy::Permissive;
        }
        if cli.dry_run {
            config.dry_run = true;
        }
        if cli.quiet {
            config.progress = false;
        }
        if cli.no_log_file {
            config.log_file = None;
        } else if let Some(path) = &cli.log_file {
            config.log_file = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

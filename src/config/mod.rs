//! Configuration management
//!
//! A run is described by a small file (TOML, or JSON when the extension is
//! `.json`) naming the `source` and `destination` trees plus optional knobs.
//! Command-line flags are layered on top, see [`Cli`].

mod cli;

pub use cli::Cli;

use crate::diff::MonthLocale;
use crate::types::SyncError;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default name of the persistent log file
pub const DEFAULT_LOG_FILE: &str = "copydiff.log";

/// Directory names that are never descended into
pub const DEFAULT_PROTECTED_MARKERS: &[&str] = &["$RECYCLE.BIN", "System Volume Information"];

/// How files are laid out at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Copy source − destination by relative path, keeping the tree shape
    #[default]
    #[serde(alias = "flat")]
    Mirror,

    /// Copy every source file into `<year>/<month>_<name>/` by mtime
    #[serde(alias = "date")]
    ByDate,
}

/// What happens when something goes wrong mid-run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort on the first unrecoverable error
    #[default]
    Strict,

    /// Log per-file failures and keep going; a missing source is an empty tree
    Permissive,
}

/// Configuration exactly as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "origem")]
    pub source: Option<PathBuf>,

    #[serde(alias = "destino")]
    pub destination: Option<PathBuf>,

    #[serde(default)]
    pub mode: SyncMode,

    #[serde(default)]
    pub policy: FailurePolicy,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    pub protected_markers: Option<Vec<String>>,

    #[serde(default)]
    pub month_locale: MonthLocale,

    pub month_names: Option<Vec<String>>,

    /// Empty string disables the log file
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    ///
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        debug!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(SyncError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&contents).map_err(|e| {
                SyncError::Config(format!("malformed JSON in {}: {}", path.display(), e))
            })
        } else {
            toml::from_str(&contents).map_err(|e| {
                SyncError::Config(format!("malformed TOML in {}: {}", path.display(), e))
            })
        }
    }

    /// Turn the raw file into a validated [`Config`]
    pub fn into_config(self) -> Result<Config, SyncError> {
        let source = self
            .source
            .ok_or_else(|| SyncError::Config("missing required key 'source'".to_string()))?;
        let destination = self
            .destination
            .ok_or_else(|| SyncError::Config("missing required key 'destination'".to_string()))?;

        let month_names = match self.month_names {
            Some(names) => names,
            None => self.month_locale.names(),
        };

        let protected_markers = self.protected_markers.unwrap_or_else(|| {
            DEFAULT_PROTECTED_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect()
        });

        let log_file = match self.log_file {
            Some(path) if path.as_os_str().is_empty() => None,
            Some(path) => Some(path),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        let config = Config {
            source,
            destination,
            mode: self.mode,
            policy: self.policy,
            dry_run: self.dry_run,
            progress: true,
            exclude_patterns: self.exclude_patterns,
            protected_markers,
            month_names,
            log_file,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory
    pub destination: PathBuf,

    /// Mirror or date-bucketed layout
    pub mode: SyncMode,

    /// Strict or permissive error handling
    pub policy: FailurePolicy,

    /// Dry run (show plan, don't execute)
    pub dry_run: bool,

    /// Draw progress bars (still hidden when stderr is not a terminal)
    pub progress: bool,

    /// Exclude patterns (gitignore-style globs)
    pub exclude_patterns: Vec<String>,

    /// Directory names whose contents are never enumerated
    pub protected_markers: Vec<String>,

    /// Twelve month names, January first
    pub month_names: Vec<String>,

    /// Persistent log file, `None` for terminal only
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            mode: SyncMode::Mirror,
            policy: FailurePolicy::Strict,
            dry_run: false,
            progress: false,
            exclude_patterns: Vec::new(),
            protected_markers: DEFAULT_PROTECTED_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            month_names: MonthLocale::English.names(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load, convert and validate a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self, SyncError> {
        ConfigFile::load(path)?.into_config()
    }

    /// Validate configuration.
    ///
    /// Existence of the source is not checked here; that is governed by the
    /// failure policy when the run starts.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.source.as_os_str().is_empty() {
            return Err(SyncError::Config("'source' must not be empty".to_string()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(SyncError::Config(
                "'destination' must not be empty".to_string(),
            ));
        }

        let source = comparable_path(&self.source);
        let destination = comparable_path(&self.destination);

        if source == destination {
            return Err(SyncError::Config(
                "Source and destination cannot be the same".to_string(),
            ));
        }

        if destination.starts_with(&source) {
            return Err(SyncError::Config(format!(
                "Destination {:?} cannot be inside source {:?}",
                self.destination, self.source
            )));
        }

        if self.month_names.len() != 12 {
            return Err(SyncError::Config(format!(
                "'month_names' must list 12 months, got {}",
                self.month_names.len()
            )));
        }

        Ok(())
    }

    pub fn is_strict(&self) -> bool {
        self.policy == FailurePolicy::Strict
    }
}

/// Absolute form of `path` for containment checks.
///
/// The longest existing ancestor is canonicalized (resolving `..` and
/// symlinks); the part that does not exist yet is appended lexically.
fn comparable_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = ancestor.canonicalize() else {
            continue;
        };
        let rest = absolute.strip_prefix(ancestor).unwrap_or(Path::new(""));
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                _ => {}
            }
        }
        return resolved;
    }
    absolute
}

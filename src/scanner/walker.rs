//! Sequential directory walker

use crate::config::Config;
use crate::types::{FileEntry, FileTree, SyncError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Per-tree ignore file, gitignore syntax
pub const IGNORE_FILE_NAME: &str = ".copydiffignore";

/// Callback for reporting scan progress
///
/// Arguments:
/// - `files_scanned`: Total number of files scanned so far
/// - `bytes_scanned`: Total bytes scanned so far
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Scan a directory and build a FileTree
///
/// Walks the directory tree recursively and collects every file, keyed by its
/// path relative to `root_path`. Hidden files and VCS ignore files are not
/// special; only `config.exclude_patterns` and `.copydiffignore` files filter.
/// Directories named like one of `config.protected_markers` (compared
/// case-insensitively) are pruned with a warning.
///
/// # Errors
/// * Missing root: `SyncError::SourceNotFound` under the strict policy, an
///   empty tree and a warning under the permissive policy
/// * Invalid exclude patterns return `SyncError::Config`
/// * Traversal and metadata failures abort a strict scan (`SyncError::Scan`)
///   and are logged and skipped by a permissive one
pub fn scan_directory(
    root_path: &Path,
    config: &Config,
    on_progress: Option<&ProgressCallback>,
) -> Result<FileTree, SyncError> {
    let start_time = Instant::now();
    let mut tree = FileTree::new(root_path.to_path_buf());

    if !root_path.is_dir() {
        if config.is_strict() {
            return Err(SyncError::SourceNotFound {
                path: root_path.to_path_buf(),
            });
        }
        warn!(root = %root_path.display(), "directory does not exist, treating it as empty");
        return Ok(tree);
    }

    let mut scanned_count: u64 = 0;
    let mut scanned_bytes: u64 = 0;

    let mut override_builder = ignore::overrides::OverrideBuilder::new(root_path);
    for pattern in &config.exclude_patterns {
        // OverrideBuilder treats `!glob` as an exclusion
        let exclude_pattern = format!("!{}", pattern);
        override_builder.add(&exclude_pattern).map_err(|e| {
            SyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build exclude overrides: {}", e)))?;

    let markers: Vec<String> = config
        .protected_markers
        .iter()
        .map(|marker| marker.to_lowercase())
        .collect();
    let protected_skipped = Arc::new(AtomicUsize::new(0));
    let protected_counter = Arc::clone(&protected_skipped);

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .overrides(overrides)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if is_dir && entry.depth() > 0 && is_protected_name(entry.file_name(), &markers) {
                warn!(
                    path = %entry.path().display(),
                    "skipping protected folder"
                );
                protected_counter.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            true
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                report_problem(config, format!("error during directory traversal: {}", e))?;
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue, // stdin, never produced for a directory root
        };

        if file_type.is_dir() {
            if entry.depth() > 0 {
                tree.increment_dirs();
            }
            continue;
        }

        // Symlinks are followed for their content; anything that is not a
        // regular file at the end of the link is ignored.
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) => {
                report_problem(
                    config,
                    format!("cannot read metadata for {}: {}", entry.path().display(), e),
                )?;
                continue;
            }
        };
        if !metadata.is_file() {
            debug!(path = %entry.path().display(), "not a regular file, skipped");
            continue;
        }

        let relative_path = match entry.path().strip_prefix(root_path) {
            Ok(p) => p.to_path_buf(),
            Err(_) => {
                report_problem(
                    config,
                    format!(
                        "cannot compute relative path for {}",
                        entry.path().display()
                    ),
                )?;
                continue;
            }
        };

        let mtime = match metadata.modified() {
            Ok(mtime) => mtime,
            Err(e) => {
                report_problem(
                    config,
                    format!(
                        "cannot read modification time for {}: {}",
                        entry.path().display(),
                        e
                    ),
                )?;
                continue;
            }
        };

        tree.insert(FileEntry::new(relative_path, metadata.len(), mtime));

        scanned_count += 1;
        scanned_bytes += metadata.len();
        if let Some(callback) = on_progress {
            callback(scanned_count, scanned_bytes);
        }
    }

    tree.protected_skipped = protected_skipped.load(Ordering::Relaxed);
    tree.set_scan_duration(start_time.elapsed());

    debug!(
        root = %root_path.display(),
        files = tree.total_files,
        dirs = tree.total_dirs,
        protected = tree.protected_skipped,
        "scan complete"
    );

    Ok(tree)
}

/// True when `name` matches one of the lowercase `markers`
fn is_protected_name(name: &std::ffi::OsStr, markers: &[String]) -> bool {
    let name = name.to_string_lossy().to_lowercase();
    markers.iter().any(|marker| *marker == name)
}

/// Strict scans stop on the first problem; permissive scans log it.
fn report_problem(config: &Config, message: String) -> Result<(), SyncError> {
    if config.is_strict() {
        return Err(SyncError::Scan(message));
    }
    warn!("{}; scan will continue", message);
    Ok(())
}

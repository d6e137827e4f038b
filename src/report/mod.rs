//! Audit report of files that already existed at the destination
//!
//! Written once at the end of a run into the destination root. Nothing is
//! written when no collision happened.

use crate::types::{CollisionLog, SyncError};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Report file name for mirror runs (one per destination, overwritten)
pub const REPORT_FILE_NAME: &str = "existing_files.txt";

const REPORT_HEADER: &str = "Files that already existed at the destination:";

/// How the report file is named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportName {
    /// `existing_files.txt`
    Fixed,
    /// `existing_files_<YYYY-MM-DD_HH-MM-SS>.txt`, one file per run
    Stamped(DateTime<Local>),
}

impl ReportName {
    pub fn file_name(&self) -> String {
        match self {
            ReportName::Fixed => REPORT_FILE_NAME.to_string(),
            ReportName::Stamped(started_at) => format!(
                "existing_files_{}.txt",
                started_at.format("%Y-%m-%d_%H-%M-%S")
            ),
        }
    }
}

/// Render the report body
pub fn format_report(log: &CollisionLog) -> String {
    let mut body = String::new();
    body.push_str(REPORT_HEADER);
    body.push_str("\n\n");
    for record in log.records() {
        let _ = writeln!(body, "{}", record);
    }
    body
}

/// Write the report into `dest_root`.
///
/// Returns the written path, or `None` when `log` is empty.
/// A failure here never undoes copies that already happened.
pub fn write_report(
    log: &CollisionLog,
    dest_root: &Path,
    name: ReportName,
) -> Result<Option<PathBuf>, SyncError> {
    if log.is_empty() {
        return Ok(None);
    }

    let path = dest_root.join(name.file_name());
    fs::write(&path, format_report(log)).map_err(|e| SyncError::Report {
        path: path.clone(),
        source: e,
    })?;

    info!(path = %path.display(), records = log.len(), "collision report saved");
    Ok(Some(path))
}

//! RunOutcome - What a copy pass did

use super::CollisionLog;
use std::path::PathBuf;

/// A per-file failure tolerated by the permissive policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    /// Source-relative path of the file
    pub path: PathBuf,
    /// Error label, see `SyncError::label`
    pub kind: &'static str,
    /// Rendered error message
    pub message: String,
}

/// Aggregate result of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Files physically copied
    pub copied: usize,

    /// Source files already present at the destination (mirror mode)
    pub skipped: usize,

    /// Bytes written to the destination
    pub bytes_copied: u64,

    /// Failures isolated by the permissive policy
    pub failures: Vec<CopyFailure>,

    /// Name collisions, in the order they were detected
    pub collisions: CollisionLog,

    /// Audit report written for this run, if any
    pub report_path: Option<PathBuf>,
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every planned file was copied
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

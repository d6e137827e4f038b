//! Error types for copydiff

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for copydiff operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid, unreadable, or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source root is absent at the start of a run
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Directory traversal failed (unreadable directory, broken metadata)
    #[error("Scan failed: {0}")]
    Scan(String),

    /// A source file disappeared between enumeration and copy
    #[error("Source file vanished before it could be copied: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Destination root or subdirectory could not be created
    #[error("Cannot create destination directory {}: {source}", path.display())]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content or metadata copy failed
    #[error("Copy failed for {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission denied for specific path
    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// Destination filesystem is full
    #[error("Disk full while writing {}", path.display())]
    DiskFull { path: PathBuf },

    /// Audit report could not be written
    #[error("Cannot write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Check if this error concerns a single file and may be isolated
    /// by the permissive policy.
    ///
    /// A directory that cannot be created is never isolated.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            SyncError::SourceMissing { .. }
                | SyncError::Copy { .. }
                | SyncError::PermissionDenied { .. }
                | SyncError::DiskFull { .. }
        )
    }

    /// Short human label for grouping errors in summaries
    pub fn label(&self) -> &'static str {
        match self {
            SyncError::Io(_) => "I/O error",
            SyncError::Config(_) => "Configuration error",
            SyncError::Scan(_) => "Scan error",
            SyncError::SourceNotFound { .. } => "Source not found",
            SyncError::SourceMissing { .. } => "Source file vanished",
            SyncError::DestinationCreate { .. } => "Cannot create directory",
            SyncError::Copy { .. } => "Copy failed",
            SyncError::PermissionDenied { .. } => "Permission denied",
            SyncError::DiskFull { .. } => "Disk full",
            SyncError::Report { .. } => "Report not written",
        }
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        matches!(self, SyncError::PermissionDenied { .. })
    }

    /// Check if this error is related to disk space
    pub fn is_disk_space_error(&self) -> bool {
        matches!(self, SyncError::DiskFull { .. })
    }

    /// Map an I/O failure on `path` during a copy to the most specific variant
    pub fn from_copy_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        if matches!(error.kind(), ErrorKind::PermissionDenied) {
            SyncError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else if matches!(error.kind(), ErrorKind::StorageFull)
            || matches!(error.raw_os_error(), Some(28 | 122))
        {
            SyncError::DiskFull {
                path: path.to_path_buf(),
            }
        } else {
            SyncError::Copy {
                path: path.to_path_buf(),
                source: error,
            }
        }
    }
}

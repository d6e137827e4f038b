//! FileEntry - Represents a single file found under a tree root

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Represents a file in a scanned tree
///
/// Identity is the relative path alone; size and mtime are carried along for
/// progress reporting and date bucketing, never for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Relative path from the tree root
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// Last modification time
    pub mtime: SystemTime,
}

impl FileEntry {
    /// Create a new FileEntry with the given parameters
    pub fn new(path: PathBuf, size: u64, mtime: SystemTime) -> Self {
        Self { path, size, mtime }
    }

    /// Normalized identity key; raw OS bytes are kept as they are
    pub fn key(&self) -> PathBuf {
        relative_key(&self.path)
    }

    /// Base name of the file (`c.txt` for `a/b/c.txt`)
    pub fn file_name(&self) -> OsString {
        self.path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default()
    }
}

/// Build the identity key for a relative path.
///
/// `.` components are dropped so `./a/b.txt` and `a/b.txt` share one key.
/// Names are never converted to UTF-8, so two distinct non-UTF-8 names
/// keep two distinct keys.
pub fn relative_key(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_) | Component::ParentDir))
        .collect()
}

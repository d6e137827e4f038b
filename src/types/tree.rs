//! FileTree - The set of files found under one root

use super::entry::relative_key;
use super::FileEntry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File tree (set of files keyed by relative path)
#[derive(Debug, Clone, PartialEq)]
pub struct FileTree {
    /// Map: normalized relative path → FileEntry
    pub entries: BTreeMap<PathBuf, FileEntry>,

    /// Aggregate statistics
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,

    /// Directories pruned because their name matched a protected marker
    pub protected_skipped: usize,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl FileTree {
    /// Create a new empty FileTree
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: BTreeMap::new(),
            total_size: 0,
            total_files: 0,
            total_dirs: 0,
            protected_skipped: 0,
            scan_duration: Duration::from_secs(0),
            root_path,
        }
    }

    /// Insert a file entry into the tree
    ///
    /// Updates aggregate statistics (total_size, total_files).
    /// If the path already exists, the old entry is replaced and statistics are adjusted.
    pub fn insert(&mut self, entry: FileEntry) {
        let key = entry.key();
        if let Some(old_entry) = self.entries.get(&key) {
            self.total_size = self.total_size.saturating_sub(old_entry.size);
            self.total_files = self.total_files.saturating_sub(1);
        }

        self.total_size += entry.size;
        self.total_files += 1;
        self.entries.insert(key, entry);
    }

    /// Get a file entry by relative path
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&FileEntry> {
        self.entries.get(&relative_key(path.as_ref()))
    }

    /// Check if a relative path exists in the tree
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(&relative_key(path.as_ref()))
    }

    /// Return the number of file entries in the tree
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over all entries, ordered by key
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    /// Entries of `self` whose relative path is absent from `other`
    pub fn difference<'a>(&'a self, other: &'a FileTree) -> impl Iterator<Item = &'a FileEntry> {
        self.entries
            .iter()
            .filter(move |(key, _)| !other.entries.contains_key(*key))
            .map(|(_, entry)| entry)
    }

    /// Set the scan duration after scanning completes
    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }

    /// Increment the directory counter
    pub fn increment_dirs(&mut self) {
        self.total_dirs += 1;
    }
}

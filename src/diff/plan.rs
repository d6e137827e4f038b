//! Copy plan generation

use crate::diff::ModificationBucket;
use crate::types::{FileEntry, FileTree};
use std::path::{Path, PathBuf};

/// One file to copy and the destination directory it goes to
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCopy {
    /// Source entry (path relative to the source root)
    pub entry: FileEntry,

    /// Target directory relative to the destination root
    pub target_dir: PathBuf,
}

impl PlannedCopy {
    /// Destination path the file would take without a rename
    pub fn target_path(&self, dest_root: &Path) -> PathBuf {
        dest_root
            .join(&self.target_dir)
            .join(self.entry.file_name())
    }
}

/// Copy plan containing actions and statistics
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CopyPlan {
    /// Files to copy, ordered by source path
    pub actions: Vec<PlannedCopy>,

    /// Aggregate statistics about the plan
    pub stats: PlanStats,
}

impl CopyPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the plan and update statistics
    pub fn add_copy(&mut self, action: PlannedCopy) {
        self.stats.copy_count += 1;
        self.stats.total_bytes += action.entry.size;
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Statistics about a copy plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanStats {
    /// Number of files to copy
    pub copy_count: usize,

    /// Source files already present at the destination
    pub skip_count: usize,

    /// Total bytes to copy
    pub total_bytes: u64,
}

/// Mirror plan: every source file whose relative path is absent from the
/// destination, kept at the same relative location.
///
/// # Example
/// ```
/// use copydiff::diff::generate_copy_plan;
/// use copydiff::types::{FileEntry, FileTree};
/// use std::path::PathBuf;
/// use std::time::UNIX_EPOCH;
///
/// let mut src = FileTree::new(PathBuf::from("src"));
/// let mut dst = FileTree::new(PathBuf::from("dst"));
/// src.insert(FileEntry::new(PathBuf::from("a.txt"), 1, UNIX_EPOCH));
/// src.insert(FileEntry::new(PathBuf::from("sub/b.txt"), 2, UNIX_EPOCH));
/// dst.insert(FileEntry::new(PathBuf::from("a.txt"), 1, UNIX_EPOCH));
///
/// let plan = generate_copy_plan(&src, &dst);
/// assert_eq!(plan.stats.copy_count, 1);
/// assert_eq!(plan.stats.skip_count, 1);
/// ```
pub fn generate_copy_plan(src_tree: &FileTree, dest_tree: &FileTree) -> CopyPlan {
    let mut plan = CopyPlan::new();

    for entry in src_tree.difference(dest_tree) {
        let target_dir = entry
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        plan.add_copy(PlannedCopy {
            entry: entry.clone(),
            target_dir,
        });
    }

    plan.stats.skip_count = src_tree.len().saturating_sub(plan.stats.copy_count);

    plan
}

/// Date plan: every source file, unconditionally, into the bucket of its
/// modification time.
pub fn generate_bucket_plan(src_tree: &FileTree, month_names: &[String]) -> CopyPlan {
    let mut plan = CopyPlan::new();

    for entry in src_tree.iter() {
        let bucket = ModificationBucket::from_mtime(entry.mtime, month_names);
        plan.add_copy(PlannedCopy {
            entry: entry.clone(),
            target_dir: bucket.relative_dir(),
        });
    }

    plan
}

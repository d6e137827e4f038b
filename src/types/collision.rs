//! CollisionRecord - Audit trail of names that already existed at the destination

use std::fmt;
use std::path::PathBuf;

/// One name collision detected while copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRecord {
    /// Name (or relative path) the file had in the source, in display form
    pub original: String,

    /// Destination path that was already occupied
    pub existing: PathBuf,

    /// Name the copy was written under, `None` if no rename happened
    pub renamed_to: Option<String>,
}

impl CollisionRecord {
    pub fn new(original: impl Into<String>, existing: PathBuf, renamed_to: Option<String>) -> Self {
        Self {
            original: original.into(),
            existing,
            renamed_to,
        }
    }
}

impl fmt::Display for CollisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.renamed_to {
            Some(new_name) => write!(
                f,
                "{} already existed at {} → renamed to: {}",
                self.original,
                self.existing.display(),
                new_name
            ),
            None => write!(
                f,
                "{} already existed at {}",
                self.original,
                self.existing.display()
            ),
        }
    }
}

/// Handle to a record inside a [`CollisionLog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(usize);

/// Ordered list of collisions for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionLog {
    records: Vec<CollisionRecord>,
}

impl CollisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a complete record
    pub fn push(&mut self, record: CollisionRecord) -> RecordId {
        self.records.push(record);
        RecordId(self.records.len() - 1)
    }

    /// Open a provisional "existed, not renamed" record
    pub fn open(&mut self, original: impl Into<String>, existing: PathBuf) -> RecordId {
        self.push(CollisionRecord::new(original, existing, None))
    }

    /// Upgrade the record behind `id` with the final name.
    ///
    /// Replaces the slot in place; the log never grows here.
    pub fn resolve(&mut self, id: RecordId, final_name: impl Into<String>) {
        if let Some(record) = self.records.get_mut(id.0) {
            record.renamed_to = Some(final_name.into());
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&CollisionRecord> {
        self.records.get(id.0)
    }

    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that ended in a rename
    pub fn renamed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.renamed_to.is_some())
            .count()
    }
}

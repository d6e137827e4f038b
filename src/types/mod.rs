//! Core type definitions for copydiff

mod collision;
mod entry;
mod error;
mod outcome;
mod tree;

pub use collision::{CollisionLog, CollisionRecord, RecordId};
pub use entry::{relative_key, FileEntry};
pub use error::SyncError;
pub use outcome::{CopyFailure, RunOutcome};
pub use tree::FileTree;

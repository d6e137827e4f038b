//! # copydiff - Differential copy without overwrites
//!
//! Copies the files of a source tree that are missing from a destination
//! tree. Nothing at the destination is ever overwritten: name collisions get
//! a `name(n).ext` rename and an entry in a plain-text report. A second mode
//! files every source file into `<year>/<month>_<name>` buckets by
//! modification date.

pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod report;
pub mod scanner;
pub mod types;
pub mod ui;

pub use config::Config;
pub use types::{CollisionRecord, FileEntry, FileTree, RunOutcome, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

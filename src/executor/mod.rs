//! Executor module for file operations

pub mod copy;
pub mod resolve;

use crate::config::SyncMode;
use crate::diff::{CopyPlan, PlannedCopy};
use crate::types::{CollisionLog, CollisionRecord, CopyFailure, RunOutcome, SyncError};
use crate::Config;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

pub use copy::copy_file_atomic;
pub use resolve::{resolve_collision, Resolution};

/// Events emitted while executing a plan.
#[derive(Debug)]
pub enum ExecutionEvent {
    /// Copy of one file started.
    CopyStart {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// File landed at `dest`, under a new name when `renamed`.
    CopySuccess {
        index: usize,
        total: usize,
        path: PathBuf,
        dest: PathBuf,
        bytes_copied: u64,
        renamed: bool,
    },
    /// File failed; under the permissive policy the executor continues.
    CopyError {
        index: usize,
        total: usize,
        path: PathBuf,
        message: String,
    },
    /// Plan execution finished (or was aborted).
    Complete {
        copied: usize,
        failed: usize,
        bytes_copied: u64,
    },
}

/// Optional callback used to receive execution events.
pub type ExecutionCallback = dyn Fn(&ExecutionEvent) + Send + Sync;

/// Execute a copy plan
///
/// Actions run sequentially. Counters, failures and collisions are
/// accumulated into `outcome`, which the caller owns so that collisions seen
/// before a strict abort can still be reported.
///
/// Under the strict policy the first error stops the run and is returned.
/// Under the permissive policy per-file errors are recorded in
/// `outcome.failures` and the next file is processed.
pub fn execute_plan(
    plan: &CopyPlan,
    config: &Config,
    outcome: &mut RunOutcome,
    on_event: Option<&ExecutionCallback>,
) -> Result<(), SyncError> {
    let total = plan.actions.len();
    let mut aborted = None;

    for (idx, action) in plan.actions.iter().enumerate() {
        let index = idx + 1;
        emit_event(
            on_event,
            ExecutionEvent::CopyStart {
                index,
                total,
                path: action.entry.path.clone(),
            },
        );

        match execute_copy(action, config, &mut outcome.collisions) {
            Ok(copied) => {
                outcome.copied += 1;
                outcome.bytes_copied += copied.bytes;
                info!(file = %action.entry.path.display(), to = %copied.dest.display(), "copied");

                emit_event(
                    on_event,
                    ExecutionEvent::CopySuccess {
                        index,
                        total,
                        path: action.entry.path.clone(),
                        dest: copied.dest,
                        bytes_copied: copied.bytes,
                        renamed: copied.renamed,
                    },
                );
            }
            Err(err) => {
                error!(file = %action.entry.path.display(), "{}", err);
                emit_event(
                    on_event,
                    ExecutionEvent::CopyError {
                        index,
                        total,
                        path: action.entry.path.clone(),
                        message: err.to_string(),
                    },
                );

                if config.is_strict() || !err.is_per_file() {
                    aborted = Some(err);
                    break;
                }
                outcome.failures.push(CopyFailure {
                    path: action.entry.path.clone(),
                    kind: err.label(),
                    message: err.to_string(),
                });
            }
        }
    }

    emit_event(
        on_event,
        ExecutionEvent::Complete {
            copied: outcome.copied,
            failed: outcome.failures.len() + usize::from(aborted.is_some()),
            bytes_copied: outcome.bytes_copied,
        },
    );

    match aborted {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Where one file landed
struct CopiedFile {
    dest: PathBuf,
    bytes: u64,
    renamed: bool,
}

fn execute_copy(
    action: &PlannedCopy,
    config: &Config,
    collisions: &mut CollisionLog,
) -> Result<CopiedFile, SyncError> {
    let src_path = config.source.join(&action.entry.path);

    // The tree was scanned earlier; the file may have gone since
    let still_there = src_path
        .try_exists()
        .map_err(|e| SyncError::from_copy_io(&src_path, e))?;
    if !still_there {
        return Err(SyncError::SourceMissing { path: src_path });
    }

    let target_dir = config.destination.join(&action.target_dir);
    fs::create_dir_all(&target_dir).map_err(|e| SyncError::DestinationCreate {
        path: target_dir.clone(),
        source: e,
    })?;

    let file_name = action.entry.file_name();
    let candidate = target_dir.join(&file_name);
    let taken = candidate
        .try_exists()
        .map_err(|e| SyncError::from_copy_io(&candidate, e))?;

    let resolution = match (config.mode, taken) {
        (_, false) => Resolution {
            name: file_name,
            renamed: false,
        },
        (SyncMode::Mirror, true) => {
            let resolution = resolve_collision(&target_dir, &file_name)?;
            collisions.push(CollisionRecord::new(
                action.entry.key().display().to_string(),
                candidate,
                Some(resolution.name.to_string_lossy().into_owned()),
            ));
            resolution
        }
        (SyncMode::ByDate, true) => {
            // Recorded before the final name is known, then upgraded in place
            let id = collisions.open(file_name.to_string_lossy(), candidate);
            let resolution = resolve_collision(&target_dir, &file_name)?;
            if resolution.renamed {
                collisions.resolve(id, resolution.name.to_string_lossy());
            }
            resolution
        }
    };

    let dest = target_dir.join(&resolution.name);
    let bytes = copy_file_atomic(&src_path, &dest)?;
    Ok(CopiedFile {
        dest,
        bytes,
        renamed: resolution.renamed,
    })
}

fn emit_event(on_event: Option<&ExecutionCallback>, event: ExecutionEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}

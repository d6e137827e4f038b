//! Atomic file copy implementation

use crate::types::SyncError;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Copy buffer size
const BUFFER_SIZE: usize = 128 * 1024;

/// Fresh temp names tried before giving up on a directory
const MAX_TEMP_ATTEMPTS: u32 = 64;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Copy a file atomically using the write-then-link strategy
///
/// 1. Write to a freshly created hidden temp file next to `dest`
/// 2. Flush and sync to disk
/// 3. Preserve metadata (permissions, mtime)
/// 4. Link the temp file to `dest`, failing if `dest` exists
///
/// The temp file is always created with `create_new`, so a user file that
/// happens to look like a temp name is never truncated or replaced, and
/// `dest` itself is never overwritten.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
/// * `Err(SyncError::SourceMissing)` - `src` vanished
/// * `Err(SyncError)` - any other copy failure; the temp file is removed
///
/// # Example
/// ```no_run
/// use copydiff::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), copydiff::types::SyncError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| SyncError::DestinationCreate {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut src_file = File::open(src).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SyncError::SourceMissing {
            path: src.to_path_buf(),
        },
        _ => SyncError::from_copy_io(src, e),
    })?;

    let (temp_path, temp_file) = create_temp_file(dir)?;
    let result = write_temp(&mut src_file, src, temp_file, &temp_path)
        .and_then(|bytes| place_without_overwrite(&temp_path, dest).map(|()| bytes));

    // Only the temp file this call created is ever removed
    let _ = fs::remove_file(&temp_path);
    result
}

/// Create a new, empty temp file in `dir` under a name nobody holds yet.
fn create_temp_file(dir: &Path) -> Result<(PathBuf, File), SyncError> {
    let pid = std::process::id();
    let mut last_err = None;

    for _ in 0..MAX_TEMP_ATTEMPTS {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(temp_name(pid, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => last_err = Some(e),
            Err(e) => return Err(SyncError::from_copy_io(&path, e)),
        }
    }

    Err(SyncError::Copy {
        path: dir.to_path_buf(),
        source: last_err.unwrap_or_else(|| ErrorKind::AlreadyExists.into()),
    })
}

/// Short hidden name, independent of the final file name's length
fn temp_name(pid: u32, n: u64) -> String {
    format!(".copydiff-{}-{}.tmp", pid, n)
}

fn write_temp(
    src_file: &mut File,
    src: &Path,
    mut temp_file: File,
    temp_path: &Path,
) -> Result<u64, SyncError> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_copy_io(src, e))?;
        if bytes_read == 0 {
            break;
        }
        temp_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| SyncError::from_copy_io(temp_path, e))?;
        total_bytes += bytes_read as u64;
    }

    temp_file
        .sync_all()
        .map_err(|e| SyncError::from_copy_io(temp_path, e))?;

    // Drop the file handle before linking (required on Windows)
    drop(temp_file);

    let src_metadata = src_file
        .metadata()
        .map_err(|e| SyncError::from_copy_io(src, e))?;

    let mtime = src_metadata
        .modified()
        .map_err(|e| SyncError::from_copy_io(src, e))?;
    filetime::set_file_mtime(temp_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| SyncError::from_copy_io(temp_path, e))?;

    // Permissions last: a read-only source would otherwise block the mtime update
    fs::set_permissions(temp_path, src_metadata.permissions())
        .map_err(|e| SyncError::from_copy_io(temp_path, e))?;

    Ok(total_bytes)
}

/// Give the finished temp file its final name without replacing anything.
///
/// A hard link fails atomically when `dest` exists. Filesystems without
/// hard links fall back to a checked rename.
fn place_without_overwrite(temp_path: &Path, dest: &Path) -> Result<(), SyncError> {
    match fs::hard_link(temp_path, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(SyncError::Copy {
            path: dest.to_path_buf(),
            source: e,
        }),
        Err(e) => {
            debug!(dest = %dest.display(), "hard link failed ({}), falling back to rename", e);
            let taken = dest
                .try_exists()
                .map_err(|e| SyncError::from_copy_io(dest, e))?;
            if taken {
                return Err(SyncError::Copy {
                    path: dest.to_path_buf(),
                    source: ErrorKind::AlreadyExists.into(),
                });
            }
            fs::rename(temp_path, dest).map_err(|e| SyncError::from_copy_io(dest, e))
        }
    }
}

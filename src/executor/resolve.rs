//! Collision resolution: pick a free name inside a destination directory

use crate::types::SyncError;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tracing::warn;

/// Outcome of a name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name to write under, byte-for-byte as the OS sees it
    pub name: OsString,
    /// True when `name` differs from the candidate
    pub renamed: bool,
}

/// Find a name that does not exist yet in `dir`.
///
/// `report.txt` is returned unchanged when free, otherwise `report(1).txt`,
/// `report(2).txt`, … are probed in order and the first free one wins.
/// Names need not be UTF-8.
///
/// The check is a plain existence probe at call time. Two processes writing
/// into the same directory can both pick the same name; the copy itself
/// then refuses to overwrite.
pub fn resolve_collision(dir: &Path, candidate: &OsStr) -> Result<Resolution, SyncError> {
    if !exists(dir, candidate)? {
        return Ok(Resolution {
            name: candidate.to_os_string(),
            renamed: false,
        });
    }

    let (stem, ext) = split_name(candidate);
    let mut counter: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!("({})", counter));
        name.push(&ext);
        if !exists(dir, &name)? {
            warn!(
                dir = %dir.display(),
                from = %Path::new(candidate).display(),
                to = %Path::new(&name).display(),
                "name already taken, renaming"
            );
            return Ok(Resolution {
                name,
                renamed: true,
            });
        }
        counter += 1;
    }
}

/// Split `name` into stem and extension (with its dot).
///
/// A leading dot belongs to the stem, so `.bashrc` has no extension and
/// `archive.tar.gz` splits as `archive.tar` + `.gz`.
pub fn split_name(name: &OsStr) -> (OsString, OsString) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            (stem.to_os_string(), dotted)
        }
        _ => (name.to_os_string(), OsString::new()),
    }
}

fn exists(dir: &Path, name: &OsStr) -> Result<bool, SyncError> {
    let path = dir.join(name);
    path.try_exists()
        .map_err(|e| SyncError::from_copy_io(&path, e))
}

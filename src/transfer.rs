//! Moving a file into the archive without ever exposing a partial copy.
//!
//! Same filesystem: a plain `rename`, which is atomic. Across filesystems:
//! copy into a hidden temporary file next to the destination, fsync,
//! verify the SHA-256 against the source hash, rename into place, and only
//! then delete the source.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{IngestError, Stage};
use crate::hashing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    Renamed,
    CopiedAndVerified,
}

/// Move `source` to `destination`. The destination must not exist; callers
/// hold the partition lock so nothing can claim it in between.
pub fn move_into_archive(
    source: &Path,
    destination: &Path,
    content_hash: &str,
) -> Result<MoveMethod, IngestError> {
    ensure_vacant(destination)?;

    match fs::rename(source, destination) {
        Ok(()) => Ok(MoveMethod::Renamed),
        Err(e) if e.kind() == io::ErrorKind::NotFound && !source.exists() => {
            Err(IngestError::io(Stage::Placed, source, e))
        }
        Err(e) => {
            debug!(
                path = %source.display(),
                dest = %destination.display(),
                error = %e,
                "rename failed, copying instead"
            );
            copy_verified(source, destination, content_hash)?;
            Ok(MoveMethod::CopiedAndVerified)
        }
    }
}

/// Copy-then-verify-then-delete. On any failure before the final rename
/// the temporary file is removed and the source is untouched.
pub fn copy_verified(source: &Path, destination: &Path, content_hash: &str) -> Result<(), IngestError> {
    ensure_vacant(destination)?;
    let temp = temp_path_for(destination);

    let result = copy_and_check(source, &temp, content_hash);
    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp, destination) {
        let _ = fs::remove_file(&temp);
        return Err(IngestError::io(Stage::Placed, destination, e));
    }

    // The archive copy is complete; a leftover source is re-detected as a
    // duplicate on the next sweep.
    if let Err(e) = fs::remove_file(source) {
        warn!(path = %source.display(), error = %e, "archived copy verified but source not removed");
    }
    Ok(())
}

fn copy_and_check(source: &Path, temp: &Path, content_hash: &str) -> Result<(), IngestError> {
    fs::copy(source, temp).map_err(|e| IngestError::io(Stage::Placed, temp, e))?;
    File::open(temp)
        .and_then(|f| f.sync_all())
        .map_err(|e| IngestError::io(Stage::Placed, temp, e))?;

    let copied = hashing::hash_file(temp).map_err(|e| IngestError::io(Stage::Placed, temp, e))?;
    if copied != content_hash {
        return Err(IngestError::VerifyMismatch {
            path: source.to_path_buf(),
            expected: content_hash.to_string(),
        });
    }
    Ok(())
}

fn ensure_vacant(destination: &Path) -> Result<(), IngestError> {
    match fs::symlink_metadata(destination) {
        Ok(_) => Err(IngestError::io(
            Stage::Placed,
            destination,
            io::Error::new(io::ErrorKind::AlreadyExists, "archive destination is occupied"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(IngestError::io(Stage::Placed, destination, e)),
    }
}

/// Hidden sibling of the destination; ignored by placement and by any
/// tool that skips dotfiles.
fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.librarian-tmp", name))
}

//! Backup copies and restore
//!
//! The backup is a byte copy of the target at `<name>.backup` in the same
//! directory. It is overwritten by each save and never deleted.

use std::fs;
use std::path::{Path, PathBuf};

use super::checksum::{compute_checksum, verify_checksum};
use super::replace::{fsync_parent, sibling_path, write_file};
use crate::errors::{EditorError, EditorResult};

/// Suffix appended to the target's file name
pub const BACKUP_SUFFIX: &str = ".backup";

/// Suffix of the staging file used while restoring
const RESTORE_SUFFIX: &str = ".restore";

pub fn backup_path(target: &Path) -> PathBuf {
    sibling_path(target, BACKUP_SUFFIX)
}

/// A verified backup of a target's pre-save bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub checksum: u32,
    pub len: u64,
}

/// Copies the target's current on-disk bytes to its backup path and checks
/// that the copy reads back with the same CRC32.
pub fn create_backup(target: &Path, fsync: bool) -> EditorResult<Backup> {
    let contents = fs::read(target).map_err(|e| EditorError::io("read", target, e))?;
    let checksum = compute_checksum(&contents);
    let path = backup_path(target);

    write_file(&path, &contents, fsync)?;
    if fsync {
        fsync_parent(&path)?;
    }

    let written = fs::read(&path).map_err(|e| EditorError::io_raw("read back", &path, e))?;
    if !verify_checksum(&written, checksum) {
        return Err(EditorError::io_raw(
            "verify",
            &path,
            std::io::Error::other("backup checksum does not match the source"),
        ));
    }

    Ok(Backup {
        path,
        checksum,
        len: contents.len() as u64,
    })
}

/// Puts the backup's bytes back at `target`.
///
/// The bytes are staged in a sibling file and renamed over the target, so a
/// half-written target from an in-place save is replaced whole.
pub fn restore_backup(target: &Path, backup: &Backup, fsync: bool) -> EditorResult<()> {
    let contents =
        fs::read(&backup.path).map_err(|e| EditorError::io_raw("read", &backup.path, e))?;
    if !verify_checksum(&contents, backup.checksum) {
        return Err(EditorError::io_raw(
            "verify",
            &backup.path,
            std::io::Error::other("backup changed since it was written"),
        ));
    }

    let staging = sibling_path(target, RESTORE_SUFFIX);
    write_file(&staging, &contents, fsync)?;
    fs::rename(&staging, target).map_err(|e| {
        let _ = fs::remove_file(&staging);
        EditorError::io_raw("restore", target, e)
    })?;
    if fsync {
        fsync_parent(target)?;
    }

    let restored = fs::read(target).map_err(|e| EditorError::io_raw("read back", target, e))?;
    if !verify_checksum(&restored, backup.checksum) {
        return Err(EditorError::io_raw(
            "verify",
            target,
            std::io::Error::other("restored file does not match the backup"),
        ));
    }
    Ok(())
}
